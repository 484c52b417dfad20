//! Backend B (Solr) wire formats.

use crate::document::TestDocument;
use crate::error::PayloadError;
use crate::query::QueryShape;
use serde::{Deserialize, Serialize};

/// Content type of an `update` request body.
pub const UPDATE_CONTENT_TYPE: &str = "application/json";

/// Document as posted to Solr, using dynamic-field suffixes
/// (`_i` integer, `_txt` text, `_s` string, `_dt` date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolrDocument {
    pub id: String,
    #[serde(rename = "doc_id_i")]
    pub doc_id: u64,
    #[serde(rename = "title_txt")]
    pub title: String,
    #[serde(rename = "content_txt")]
    pub content: String,
    #[serde(rename = "category_s")]
    pub category: String,
    #[serde(rename = "doc_size_i")]
    pub doc_size: u32,
    #[serde(rename = "batch_number_i")]
    pub batch_number: u64,
    #[serde(rename = "created_timestamp_dt")]
    pub timestamp: String,
    #[serde(rename = "lab_phase_s")]
    pub lab_phase: String,
}

impl From<&TestDocument> for SolrDocument {
    fn from(doc: &TestDocument) -> Self {
        Self {
            id: format!("solr-concurrent-{}", doc.doc_id),
            doc_id: doc.doc_id,
            title: doc.title.clone(),
            content: doc.content.clone(),
            category: doc.category.clone(),
            doc_size: doc.doc_size,
            batch_number: doc.batch_number,
            timestamp: doc.timestamp.clone(),
            lab_phase: doc.lab_phase.clone(),
        }
    }
}

/// Render a batch as the JSON array accepted by the `update` handler.
pub fn update_body(docs: &[TestDocument]) -> Result<Vec<u8>, PayloadError> {
    if docs.is_empty() {
        return Err(PayloadError::EmptyBatch);
    }

    let solr_docs: Vec<SolrDocument> = docs.iter().map(SolrDocument::from).collect();
    Ok(serde_json::to_vec(&solr_docs)?)
}

/// Query-string parameters of the `select` request for a shape.
///
/// Values are unencoded; the HTTP client is responsible for encoding them.
pub fn select_params(shape: QueryShape) -> &'static [(&'static str, &'static str)] {
    match shape {
        QueryShape::TermMatch => &[("q", "category_s:concurrent_load"), ("rows", "50")],
        QueryShape::NumericRange => &[("q", "doc_size_i:[2000 TO 5000]"), ("rows", "30")],
        QueryShape::CompoundBoolean => &[
            (
                "q",
                "content_txt:concurrent AND lab_phase_s:concurrent_readwrite",
            ),
            ("rows", "20"),
        ],
        QueryShape::Aggregation => &[
            ("q", "*:*"),
            ("facet", "true"),
            ("facet.field", "category_s"),
            ("rows", "0"),
        ],
    }
}
