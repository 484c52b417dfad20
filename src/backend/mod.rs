//! Search backends under test.
//!
//! Each backend implements [`SearchBackend`]: it turns a batch of
//! [`TestDocument`]s into one bulk write and a [`QueryShape`] into one query,
//! in its own wire format. Workers only see the trait, so tests can swap in
//! [`crate::testing::MockBackend`].
//!
//! Any failure (transport, non-2xx status, backend-reported item errors,
//! payload serialization) is returned as a [`BackendError`]; the caller
//! decides how to account for it.

mod elasticsearch;
mod solr;

pub use elasticsearch::ElasticsearchBackend;
pub use solr::SolrBackend;

use loadtest_payload::{PayloadError, QueryShape, TestDocument};
use thiserror::Error;

/// Error returned by a single backend operation.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The request body could not be built.
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// The request did not complete (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{backend} returned status {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    /// The backend accepted the request but reported a failure in its body.
    #[error("{backend} rejected the request: {reason}")]
    Rejected {
        backend: &'static str,
        reason: String,
    },
}

/// Where a backend's generated documents start and how they are titled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentProfile {
    /// Identifier of the first document a worker generates.
    pub first_id: u64,
    pub title_prefix: &'static str,
}

/// A search engine that receives bulk writes and queries.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Identifier range and titles for documents written to this backend.
    fn document_profile(&self) -> DocumentProfile;

    /// Serialize `docs` into the backend's bulk format and write them in one
    /// request.
    async fn bulk_index(&self, docs: &[TestDocument]) -> Result<(), BackendError>;

    /// Issue one query of the given shape.
    async fn search(&self, shape: QueryShape) -> Result<(), BackendError>;
}

/// Turn a non-success response into [`BackendError::Status`].
async fn check_status(
    backend: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(512)
        .collect();
    Err(BackendError::Status {
        backend,
        status: status.as_u16(),
        body,
    })
}
