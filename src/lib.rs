//! search-loadtest library
//!
//! Generates sustained, concurrent read and write traffic against an
//! Elasticsearch index and a Solr core, and measures how indexing throughput
//! and query latency hold up under the mixed load.
//!
//! # Architecture
//!
//! ```text
//!                      RunCoordinator (deadline + CancellationToken)
//!                                   │
//!        ┌──────────────┬───────────┼──────────────┬──────────────┐
//!        ▼              ▼           │              ▼              ▼
//!   es-index       es-query         │         solr-index     solr-query
//!   (RateLimitedWorker × 4, each with its own timer and PayloadGenerator)
//!        │              │           │              │              │
//!        └──────────────┴─────► MetricsStore ◄─────┴──────────────┘
//!                                   │
//!                   StatsReporter ◄─┤ (periodic, read-only)
//!                                   ▼
//!                       report::analyze (after join)
//! ```
//!
//! Payload construction lives in the `loadtest-payload` crate and the shared
//! metrics in `loadtest-metrics`.

pub mod backend;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod report;
pub mod testing;
pub mod worker;

pub use backend::{BackendError, SearchBackend};
pub use config::RunConfig;
pub use coordinator::{RunCoordinator, RunOutcome};
pub use report::{analyze, PerformanceReport};
pub use worker::{RateLimitedWorker, WorkerKind, WorkerState, WorkerSummary};
