//! Document record shared by both backends.

use serde::{Deserialize, Serialize};

/// Category tag carried by every generated document.
pub const CATEGORY: &str = "concurrent_load";

/// Phase tag carried by every generated document.
pub const LAB_PHASE: &str = "concurrent_readwrite";

/// Lower bound (inclusive) of the randomized `doc_size` field.
pub const DOC_SIZE_MIN: u32 = 2000;

/// Upper bound (exclusive) of the randomized `doc_size` field.
pub const DOC_SIZE_MAX: u32 = 7000;

/// A synthetic document as indexed by the load tester.
///
/// Field names match the backend A document mapping; backend B renames them
/// with dynamic-field suffixes (see [`crate::solr::SolrDocument`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDocument {
    pub doc_id: u64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub doc_size: u32,
    pub batch_number: u64,
    #[serde(rename = "created_timestamp")]
    pub timestamp: String,
    pub lab_phase: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_field_names() {
        let doc = TestDocument {
            doc_id: 20000,
            title: "Concurrent Load Document 20000".to_string(),
            content: "body".to_string(),
            category: CATEGORY.to_string(),
            doc_size: 2500,
            batch_number: 3,
            timestamp: "2024-01-15T10:30:00Z".to_string(),
            lab_phase: LAB_PHASE.to_string(),
        };

        let json = serde_json::to_value(&doc).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 8);
        assert_eq!(json["doc_id"], 20000);
        assert_eq!(json["doc_size"], 2500);
        assert_eq!(json["batch_number"], 3);
        assert_eq!(json["created_timestamp"], "2024-01-15T10:30:00Z");
        assert_eq!(json["lab_phase"], "concurrent_readwrite");
        assert!(object.get("timestamp").is_none());
    }
}
