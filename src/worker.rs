//! Rate-limited operation workers.
//!
//! A run has four workers: one index and one query worker per backend. Each
//! one owns an independent timer and payload generator, and only shares the
//! [`MetricsStore`] with the others.

use crate::backend::SearchBackend;
use loadtest_metrics::MetricsStore;
use loadtest_payload::PayloadGenerator;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker {worker} needs a positive finite rate, got {rate}")]
    InvalidRate { worker: String, rate: f64 },

    #[error("Worker {worker} rate {rate}/s gives a tick period outside the timer's range")]
    PeriodOutOfRange { worker: String, rate: f64 },
}

/// Operation a worker performs on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    /// One bulk write of `bulk_size` documents.
    Index,
    /// One query drawn from the query pool.
    Query,
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKind::Index => write!(f, "index"),
            WorkerKind::Query => write!(f, "query"),
        }
    }
}

/// Lifecycle of a worker.
///
/// `Idle` between ticks, `Ticking` while an operation and its bookkeeping run,
/// `Stopping` once cancellation has been observed, `Stopped` when the worker
/// has returned and will never touch the metrics store again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Ticking = 1,
    Stopping = 2,
    Stopped = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Ticking,
            2 => WorkerState::Stopping,
            _ => WorkerState::Stopped,
        }
    }
}

/// Cloneable, read-only view of a worker's state.
#[derive(Debug, Clone)]
pub struct StateHandle(Arc<AtomicU8>);

impl StateHandle {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(WorkerState::Idle as u8)))
    }

    pub fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// What one worker did over the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub name: String,
    pub backend: &'static str,
    pub kind: WorkerKind,
    /// Timer firings, each of which issued exactly one operation.
    pub ticks: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Items recorded into the store: documents for index workers, queries
    /// for query workers.
    pub items: u64,
}

/// Fires one operation against one backend every `1 / rate` seconds until
/// cancelled.
pub struct RateLimitedWorker {
    kind: WorkerKind,
    backend: Arc<dyn SearchBackend>,
    metrics: Arc<MetricsStore>,
    generator: PayloadGenerator,
    bulk_size: usize,
    period: Duration,
    state: StateHandle,
    summary: WorkerSummary,
}

impl RateLimitedWorker {
    /// Build a worker. Fails when `rate` is not a positive finite number.
    ///
    /// `rng` seeds the worker's payload generator; document identifiers start
    /// at the backend's [`crate::backend::DocumentProfile::first_id`].
    pub fn new(
        kind: WorkerKind,
        backend: Arc<dyn SearchBackend>,
        metrics: Arc<MetricsStore>,
        rate: f64,
        bulk_size: usize,
        rng: StdRng,
    ) -> Result<Self, WorkerError> {
        let name = format!("{}-{}", backend.name(), kind);

        if !rate.is_finite() || rate <= 0.0 {
            return Err(WorkerError::InvalidRate { worker: name, rate });
        }
        // The first deadline is `now + period`, so that sum must fit as well
        let period = match Duration::try_from_secs_f64(1.0 / rate) {
            Ok(period) if !period.is_zero() && Instant::now().checked_add(period).is_some() => {
                period
            }
            _ => return Err(WorkerError::PeriodOutOfRange { worker: name, rate }),
        };

        let profile = backend.document_profile();
        let generator =
            PayloadGenerator::with_rng(profile.first_id, rng).with_title_prefix(profile.title_prefix);

        let summary = WorkerSummary {
            name,
            backend: backend.name(),
            kind,
            ticks: 0,
            succeeded: 0,
            failed: 0,
            items: 0,
        };

        Ok(Self {
            kind,
            backend,
            metrics,
            generator,
            bulk_size,
            period,
            state: StateHandle::new(),
            summary,
        })
    }

    pub fn name(&self) -> &str {
        &self.summary.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> StateHandle {
        self.state.clone()
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// The first tick fires one period after the call. Cancellation is
    /// observed between ticks; an operation already in flight completes and
    /// is recorded before the worker returns.
    pub async fn run(mut self, shutdown: CancellationToken) -> WorkerSummary {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!("{} started with period {:?}", self.summary.name, self.period);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.state.set(WorkerState::Ticking);
                    self.tick().await;
                    self.state.set(WorkerState::Idle);
                }
            }
        }

        self.state.set(WorkerState::Stopping);
        info!(
            "{} stopped: {} ticks, {} ok, {} failed",
            self.summary.name, self.summary.ticks, self.summary.succeeded, self.summary.failed
        );
        self.state.set(WorkerState::Stopped);

        self.summary
    }

    async fn tick(&mut self) {
        self.summary.ticks += 1;

        match self.kind {
            WorkerKind::Index => {
                let started = Instant::now();
                let docs = self.generator.next_batch(self.bulk_size);
                match self.backend.bulk_index(&docs).await {
                    Ok(()) => {
                        let count = docs.len() as u64;
                        self.metrics.record_indexed(count, started.elapsed());
                        self.summary.succeeded += 1;
                        self.summary.items += count;
                    }
                    Err(e) => {
                        warn!("{} bulk write failed: {e}", self.summary.name);
                        self.metrics.record_indexing_error();
                        self.summary.failed += 1;
                    }
                }
            }
            WorkerKind::Query => {
                let shape = self.generator.next_query();
                let started = Instant::now();
                match self.backend.search(shape).await {
                    Ok(()) => {
                        self.metrics.record_query(started.elapsed());
                        self.summary.succeeded += 1;
                        self.summary.items += 1;
                    }
                    Err(e) => {
                        warn!("{} {shape} query failed: {e}", self.summary.name);
                        self.metrics.record_query_error();
                        self.summary.failed += 1;
                    }
                }
            }
        }
    }
}
