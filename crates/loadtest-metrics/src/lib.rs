//! Metrics aggregation for the search-loadtest concurrent load tester.
//!
//! [`MetricsStore`] is the single shared aggregator of a run. Every worker
//! holds an `Arc<MetricsStore>` and records outcomes into it; the
//! [`StatsReporter`] reads progress snapshots from it while the run is in
//! flight; the final report reads a [`FinalMetrics`] taken once every worker
//! has been joined.
//!
//! Counters are lock-free atomics. Latency samples live behind a
//! reader/writer lock per operation class, so a snapshot never observes a
//! partially appended sample.

pub mod latency;
pub mod reporter;
pub mod snapshot;
pub mod store;

pub use latency::{mean, LatencySamples};
pub use reporter::StatsReporter;
pub use snapshot::{Counters, ProgressSnapshot};
pub use store::{FinalMetrics, MetricsStore};
