//! Backend A (Elasticsearch) wire formats.

use crate::document::{TestDocument, CATEGORY, LAB_PHASE};
use crate::error::PayloadError;
use crate::query::QueryShape;
use serde_json::json;

/// Content type of a `_bulk` request body.
pub const BULK_CONTENT_TYPE: &str = "application/x-ndjson";

/// Content type of a `_search` request body.
pub const SEARCH_CONTENT_TYPE: &str = "application/json";

/// Render a batch as a `_bulk` NDJSON body.
///
/// Every document contributes an action line followed by the document line.
/// The body always ends with a newline, which the bulk endpoint requires.
pub fn bulk_body(docs: &[TestDocument]) -> Result<Vec<u8>, PayloadError> {
    if docs.is_empty() {
        return Err(PayloadError::EmptyBatch);
    }

    let mut body = Vec::with_capacity(docs.len() * 384);
    for doc in docs {
        let action = json!({ "index": { "_id": doc.doc_id.to_string() } });
        serde_json::to_writer(&mut body, &action)?;
        body.push(b'\n');
        serde_json::to_writer(&mut body, doc)?;
        body.push(b'\n');
    }

    Ok(body)
}

/// Render a query shape as a `_search` request body.
pub fn search_body(shape: QueryShape) -> Result<Vec<u8>, PayloadError> {
    let query = match shape {
        QueryShape::TermMatch => json!({
            "query": { "match": { "category": CATEGORY } },
            "size": 50
        }),
        QueryShape::NumericRange => json!({
            "query": { "range": { "doc_size": { "gte": 2000, "lte": 5000 } } },
            "size": 30
        }),
        QueryShape::CompoundBoolean => json!({
            "query": {
                "bool": {
                    "must": [
                        { "match": { "content": "concurrent" } },
                        { "term": { "lab_phase": LAB_PHASE } }
                    ]
                }
            },
            "size": 20
        }),
        QueryShape::Aggregation => json!({
            "query": { "match_all": {} },
            "aggs": { "category_breakdown": { "terms": { "field": "category" } } },
            "size": 0
        }),
    };

    Ok(serde_json::to_vec(&query)?)
}
