//! The shared run-wide metrics aggregator.

use crate::latency::LatencySamples;
use crate::snapshot::{Counters, ProgressSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Concurrency-safe aggregator of run counters and latency samples.
///
/// Shared by reference (`Arc<MetricsStore>`) between all workers, the stats
/// reporter and the final report. None of its operations can fail: a poisoned
/// sample lock is recovered, since every write is a single append that leaves
/// the sequence consistent.
#[derive(Debug)]
pub struct MetricsStore {
    documents_indexed: AtomicU64,
    indexing_errors: AtomicU64,
    queries_executed: AtomicU64,
    query_errors: AtomicU64,
    indexing_latency: RwLock<LatencySamples>,
    query_latency: RwLock<LatencySamples>,
    started_at: OnceLock<Instant>,
    finished_at: OnceLock<Instant>,
}

/// Final state of a run, taken after every worker stopped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalMetrics {
    pub counters: Counters,
    pub indexing_latency: Vec<Duration>,
    pub query_latency: Vec<Duration>,
    /// Wall-clock time between start and finish marks.
    pub elapsed: Duration,
}

impl MetricsStore {
    /// Create a store with unbounded latency sequences.
    pub fn new() -> Self {
        Self::with_latency_samples(LatencySamples::unbounded(), LatencySamples::unbounded())
    }

    /// Create a store whose latency sequences keep at most `capacity` samples
    /// each (reservoir sampling).
    pub fn with_sample_capacity(capacity: usize, seed: u64) -> Self {
        Self::with_latency_samples(
            LatencySamples::reservoir(capacity, seed),
            LatencySamples::reservoir(capacity, seed.wrapping_add(1)),
        )
    }

    fn with_latency_samples(indexing: LatencySamples, query: LatencySamples) -> Self {
        Self {
            documents_indexed: AtomicU64::new(0),
            indexing_errors: AtomicU64::new(0),
            queries_executed: AtomicU64::new(0),
            query_errors: AtomicU64::new(0),
            indexing_latency: RwLock::new(indexing),
            query_latency: RwLock::new(query),
            started_at: OnceLock::new(),
            finished_at: OnceLock::new(),
        }
    }

    /// Record the run start. Only the first call has an effect.
    pub fn mark_started(&self) -> Instant {
        *self.started_at.get_or_init(Instant::now)
    }

    /// Record the run end. Only the first call has an effect.
    pub fn mark_finished(&self) -> Instant {
        *self.finished_at.get_or_init(Instant::now)
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at.get().copied()
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at.get().copied()
    }

    /// Record a successful bulk write of `documents` documents.
    pub fn record_indexed(&self, documents: u64, latency: Duration) {
        self.documents_indexed.fetch_add(documents, Ordering::Relaxed);
        self.indexing_latency
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(latency);
    }

    /// Record a failed bulk write.
    pub fn record_indexing_error(&self) {
        self.indexing_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful query.
    pub fn record_query(&self, latency: Duration) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        self.query_latency
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(latency);
    }

    /// Record a failed query.
    pub fn record_query_error(&self) {
        self.query_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values. Never takes a lock.
    pub fn counters(&self) -> Counters {
        Counters {
            documents_indexed: self.documents_indexed.load(Ordering::Relaxed),
            indexing_errors: self.indexing_errors.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            query_errors: self.query_errors.load(Ordering::Relaxed),
        }
    }

    /// Number of latency samples retained per class (indexing, query).
    pub fn sample_counts(&self) -> (usize, usize) {
        let indexing = self
            .indexing_latency
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let query = self
            .query_latency
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        (indexing, query)
    }

    /// Progress snapshot relative to the start mark. Elapsed time is zero
    /// until the run has been marked as started.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let now = Instant::now();
        let elapsed = self
            .started_at()
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();

        ProgressSnapshot {
            elapsed,
            counters: self.counters(),
        }
    }

    /// Copy out the final state of the run.
    ///
    /// Meant to be called once, after every producer has been joined. A run
    /// without a finish mark is measured up to now.
    pub fn finalize(&self) -> FinalMetrics {
        let end = self.finished_at().unwrap_or_else(Instant::now);
        let elapsed = self
            .started_at()
            .map(|start| end.saturating_duration_since(start))
            .unwrap_or_default();

        let indexing_latency = self
            .indexing_latency
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samples()
            .to_vec();
        let query_latency = self
            .query_latency
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samples()
            .to_vec();

        FinalMetrics {
            counters: self.counters(),
            indexing_latency,
            query_latency,
            elapsed,
        }
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_store_is_empty() {
        let store = MetricsStore::new();

        assert_eq!(store.counters(), Counters::default());
        assert_eq!(store.sample_counts(), (0, 0));
        assert!(store.started_at().is_none());
        assert!(store.finished_at().is_none());
    }

    #[test]
    fn test_record_outcomes() {
        let store = MetricsStore::new();

        store.record_indexed(10, Duration::from_millis(40));
        store.record_indexed(10, Duration::from_millis(60));
        store.record_indexing_error();
        store.record_query(Duration::from_millis(5));
        store.record_query_error();
        store.record_query_error();

        let counters = store.counters();
        assert_eq!(counters.documents_indexed, 20);
        assert_eq!(counters.indexing_errors, 1);
        assert_eq!(counters.queries_executed, 1);
        assert_eq!(counters.query_errors, 2);
        assert_eq!(store.sample_counts(), (2, 1));
    }

    #[test]
    fn test_errors_do_not_add_samples() {
        let store = MetricsStore::new();

        store.record_indexing_error();
        store.record_query_error();

        assert_eq!(store.sample_counts(), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_marks_are_set_once() {
        let store = MetricsStore::new();

        let start = store.mark_started();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.mark_started(), start);

        let end = store.mark_finished();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.mark_finished(), end);

        assert_eq!(store.finalize().elapsed, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_elapsed() {
        let store = MetricsStore::new();
        store.mark_started();
        store.record_indexed(10, Duration::from_millis(1));

        tokio::time::advance(Duration::from_secs(10)).await;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.elapsed, Duration::from_secs(10));
        assert_eq!(snapshot.indexed_per_second(), 1.0);
    }

    #[test]
    fn test_finalize_copies_samples_in_order() {
        let store = MetricsStore::new();
        store.mark_started();
        store.record_query(Duration::from_millis(1));
        store.record_query(Duration::from_millis(2));
        store.mark_finished();

        let final_metrics = store.finalize();
        assert_eq!(
            final_metrics.query_latency,
            vec![Duration::from_millis(1), Duration::from_millis(2)]
        );
        assert!(final_metrics.indexing_latency.is_empty());
    }

    #[test]
    fn test_sample_capacity_bounds_both_classes() {
        let store = MetricsStore::with_sample_capacity(8, 42);
        for _ in 0..100 {
            store.record_indexed(1, Duration::from_millis(3));
            store.record_query(Duration::from_millis(3));
        }

        assert_eq!(store.sample_counts(), (8, 8));
        // Counters are not affected by the sample cap
        assert_eq!(store.counters().documents_indexed, 100);
        assert_eq!(store.counters().queries_executed, 100);
    }

    #[test]
    fn test_concurrent_updates() {
        let store = Arc::new(MetricsStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        store.record_indexed(10, Duration::from_micros(100));
                        store.record_query(Duration::from_micros(50));
                        store.record_query_error();
                    }
                })
            })
            .collect();

        // Concurrent reader: counters never decrease
        let reader = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let mut last = Counters::default();
                for _ in 0..1000 {
                    let current = store.counters();
                    assert!(current.documents_indexed >= last.documents_indexed);
                    assert!(current.queries_executed >= last.queries_executed);
                    assert!(current.query_errors >= last.query_errors);
                    let (indexing, query) = store.sample_counts();
                    assert!(indexing <= 4000 && query <= 4000);
                    last = current;
                }
            })
        };

        for handle in handles {
            handle.join().unwrap();
        }
        reader.join().unwrap();

        let counters = store.counters();
        assert_eq!(counters.documents_indexed, 40_000);
        assert_eq!(counters.queries_executed, 4000);
        assert_eq!(counters.query_errors, 4000);
        assert_eq!(store.sample_counts(), (4000, 4000));
    }
}
