//! In-process backend for tests.
//!
//! [`MockBackend`] answers every request after a fixed delay, can be told to
//! fail every n-th write or query, and remembers what it received so tests can
//! assert on request counts and document identifiers.

use crate::backend::{BackendError, DocumentProfile, SearchBackend};
use loadtest_payload::{QueryShape, TestDocument};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub struct MockBackend {
    name: &'static str,
    profile: DocumentProfile,
    latency: Duration,
    fail_every_nth_write: Option<u64>,
    fail_every_nth_query: Option<u64>,
    write_attempts: AtomicU64,
    query_attempts: AtomicU64,
    received_ids: Mutex<Vec<u64>>,
    received_shapes: Mutex<Vec<QueryShape>>,
}

impl MockBackend {
    pub fn new(name: &'static str, profile: DocumentProfile) -> Self {
        Self {
            name,
            profile,
            latency: Duration::ZERO,
            fail_every_nth_write: None,
            fail_every_nth_query: None,
            write_attempts: AtomicU64::new(0),
            query_attempts: AtomicU64::new(0),
            received_ids: Mutex::new(Vec::new()),
            received_shapes: Mutex::new(Vec::new()),
        }
    }

    /// Mock with the Elasticsearch name and identifier range.
    pub fn elasticsearch() -> Self {
        Self::new(
            "elasticsearch",
            DocumentProfile {
                first_id: 20_000,
                title_prefix: "Concurrent Load Document",
            },
        )
    }

    /// Mock with the Solr name and identifier range.
    pub fn solr() -> Self {
        Self::new(
            "solr",
            DocumentProfile {
                first_id: 1_000_000_000,
                title_prefix: "Solr Concurrent Load Document",
            },
        )
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the n-th, 2n-th, ... write attempt.
    pub fn fail_every_nth_write(mut self, n: u64) -> Self {
        self.fail_every_nth_write = Some(n.max(1));
        self
    }

    /// Fail the n-th, 2n-th, ... query attempt.
    pub fn fail_every_nth_query(mut self, n: u64) -> Self {
        self.fail_every_nth_query = Some(n.max(1));
        self
    }

    pub fn write_attempts(&self) -> u64 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub fn query_attempts(&self) -> u64 {
        self.query_attempts.load(Ordering::SeqCst)
    }

    /// Identifiers of every document received, in arrival order, including
    /// those of failed writes.
    pub fn received_ids(&self) -> Vec<u64> {
        self.received_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn received_shapes(&self) -> Vec<QueryShape> {
        self.received_shapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn respond(&self, attempt: u64, fail_every: Option<u64>) -> Result<(), BackendError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match fail_every {
            Some(n) if attempt % n == 0 => Err(BackendError::Rejected {
                backend: self.name,
                reason: format!("injected failure on attempt {attempt}"),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl SearchBackend for MockBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn document_profile(&self) -> DocumentProfile {
        self.profile
    }

    async fn bulk_index(&self, docs: &[TestDocument]) -> Result<(), BackendError> {
        let attempt = self.write_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.received_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(docs.iter().map(|doc| doc.doc_id));

        self.respond(attempt, self.fail_every_nth_write).await
    }

    async fn search(&self, shape: QueryShape) -> Result<(), BackendError> {
        let attempt = self.query_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.received_shapes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(shape);

        self.respond(attempt, self.fail_every_nth_query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fails_every_nth_write() {
        let backend = MockBackend::elasticsearch().fail_every_nth_write(3);

        let mut outcomes = Vec::new();
        for _ in 0..6 {
            outcomes.push(backend.bulk_index(&[]).await.is_ok());
        }

        assert_eq!(outcomes, vec![true, true, false, true, true, false]);
        assert_eq!(backend.write_attempts(), 6);
        assert_eq!(backend.query_attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let backend = MockBackend::solr().with_latency(Duration::from_millis(50));

        let start = tokio::time::Instant::now();
        backend.search(QueryShape::TermMatch).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(50));
        assert_eq!(backend.received_shapes(), vec![QueryShape::TermMatch]);
    }
}
