//! Error types for payload serialization.

use thiserror::Error;

/// Errors that can occur while rendering a payload into a wire format.
#[derive(Error, Debug)]
pub enum PayloadError {
    /// A bulk request was requested for zero documents.
    #[error("Bulk payload requires at least one document")]
    EmptyBatch,

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
