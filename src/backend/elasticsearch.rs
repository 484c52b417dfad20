//! Elasticsearch backend.

use super::{check_status, BackendError, DocumentProfile, SearchBackend};
use loadtest_payload::{elasticsearch, QueryShape, TestDocument};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const NAME: &str = "elasticsearch";

/// First document identifier, above the ids of pre-existing baseline data.
pub const FIRST_DOC_ID: u64 = 20_000;

/// Subset of the `_bulk` response used to detect per-item failures.
#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
}

/// Elasticsearch index reached over HTTP.
pub struct ElasticsearchBackend {
    client: Client,
    bulk_url: String,
    search_url: String,
}

impl ElasticsearchBackend {
    pub fn new(client: Client, endpoint: &str, index: &str) -> Self {
        let base = format!("{}/{}", endpoint.trim_end_matches('/'), index);
        Self {
            client,
            bulk_url: format!("{base}/_bulk"),
            search_url: format!("{base}/_search"),
        }
    }

    pub fn bulk_url(&self) -> &str {
        &self.bulk_url
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait::async_trait]
impl SearchBackend for ElasticsearchBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn document_profile(&self) -> DocumentProfile {
        DocumentProfile {
            first_id: FIRST_DOC_ID,
            title_prefix: "Concurrent Load Document",
        }
    }

    async fn bulk_index(&self, docs: &[TestDocument]) -> Result<(), BackendError> {
        let body = elasticsearch::bulk_body(docs)?;

        let response = self
            .client
            .post(&self.bulk_url)
            .header(CONTENT_TYPE, elasticsearch::BULK_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let response = check_status(NAME, response).await?;

        // A 200 response can still carry per-item failures
        let bulk: BulkResponse = response.json().await?;
        if bulk.errors {
            return Err(BackendError::Rejected {
                backend: NAME,
                reason: format!("bulk response reported item errors ({} docs)", docs.len()),
            });
        }

        debug!("Indexed {} documents into {}", docs.len(), self.bulk_url);
        Ok(())
    }

    async fn search(&self, shape: QueryShape) -> Result<(), BackendError> {
        let body = elasticsearch::search_body(shape)?;

        let response = self
            .client
            .post(&self.search_url)
            .header(CONTENT_TYPE, elasticsearch::SEARCH_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let response = check_status(NAME, response).await?;
        response.bytes().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let backend =
            ElasticsearchBackend::new(Client::new(), "http://localhost:9199/", "performance_baseline");

        assert_eq!(
            backend.bulk_url(),
            "http://localhost:9199/performance_baseline/_bulk"
        );
        assert_eq!(
            backend.search_url(),
            "http://localhost:9199/performance_baseline/_search"
        );
    }

    #[test]
    fn test_document_profile() {
        let backend = ElasticsearchBackend::new(Client::new(), "http://localhost:9199", "idx");
        assert_eq!(backend.document_profile().first_id, 20_000);
        assert_eq!(backend.name(), "elasticsearch");
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_payload_error() {
        // Nothing listens on the discard port; the error comes before any send
        let backend = ElasticsearchBackend::new(Client::new(), "http://127.0.0.1:9", "idx");
        let err = backend.bulk_index(&[]).await.unwrap_err();
        assert!(matches!(err, BackendError::Payload(_)));
    }

    #[test]
    fn test_bulk_response_errors_flag() {
        let ok: BulkResponse = serde_json::from_str(r#"{"took":3,"errors":false,"items":[]}"#).unwrap();
        assert!(!ok.errors);

        let failed: BulkResponse = serde_json::from_str(r#"{"took":3,"errors":true,"items":[]}"#).unwrap();
        assert!(failed.errors);
    }
}
