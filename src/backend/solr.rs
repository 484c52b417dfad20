//! Solr backend.

use super::{check_status, BackendError, DocumentProfile, SearchBackend};
use loadtest_payload::{solr, QueryShape, TestDocument};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

const NAME: &str = "solr";

/// First document identifier. The Elasticsearch worker counts up from 20000
/// and cannot reach this in any realistic run.
pub const FIRST_DOC_ID: u64 = 1_000_000_000;

/// Solr core reached over HTTP.
pub struct SolrBackend {
    client: Client,
    update_url: String,
    select_url: String,
}

impl SolrBackend {
    pub fn new(client: Client, endpoint: &str, core: &str) -> Self {
        let base = format!("{}/solr/{}", endpoint.trim_end_matches('/'), core);
        Self {
            client,
            update_url: format!("{base}/update?commit=true"),
            select_url: format!("{base}/select"),
        }
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    pub fn select_url(&self) -> &str {
        &self.select_url
    }
}

#[async_trait::async_trait]
impl SearchBackend for SolrBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn document_profile(&self) -> DocumentProfile {
        DocumentProfile {
            first_id: FIRST_DOC_ID,
            title_prefix: "Solr Concurrent Load Document",
        }
    }

    async fn bulk_index(&self, docs: &[TestDocument]) -> Result<(), BackendError> {
        let body = solr::update_body(docs)?;

        let response = self
            .client
            .post(&self.update_url)
            .header(CONTENT_TYPE, solr::UPDATE_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let response = check_status(NAME, response).await?;
        response.bytes().await?;

        debug!("Indexed {} documents into {}", docs.len(), self.update_url);
        Ok(())
    }

    async fn search(&self, shape: QueryShape) -> Result<(), BackendError> {
        let response = self
            .client
            .get(&self.select_url)
            .query(solr::select_params(shape))
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
        let backend = SolrBackend::new(Client::new(), "http://localhost:8999", "performance_baseline");

        assert_eq!(
            backend.update_url(),
            "http://localhost:8999/solr/performance_baseline/update?commit=true"
        );
        assert_eq!(
            backend.select_url(),
            "http://localhost:8999/solr/performance_baseline/select"
        );
    }

    #[test]
    fn test_document_profile() {
        let backend = SolrBackend::new(Client::new(), "http://localhost:8999", "core");
        assert_eq!(backend.document_profile().first_id, 1_000_000_000);
        assert_eq!(backend.name(), "solr");
    }
}
