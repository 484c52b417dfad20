//! Orchestration of a single load test run.

use crate::backend::{ElasticsearchBackend, SearchBackend, SolrBackend};
use crate::config::{ConfigError, RunConfig};
use crate::worker::{RateLimitedWorker, StateHandle, WorkerKind, WorkerSummary};
use anyhow::Context;
use loadtest_metrics::{FinalMetrics, MetricsStore, StatsReporter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub metrics: FinalMetrics,
    /// One entry per worker, in start order.
    pub workers: Vec<WorkerSummary>,
    /// Progress lines printed by the stats reporter.
    pub snapshots: u64,
    /// Whether the run ended through the parent token rather than the
    /// configured duration.
    pub cancelled_early: bool,
    /// Seed the payload generators were derived from.
    pub seed: u64,
}

/// Runs the four workers and the optional reporter for one configured
/// duration, then hands back the finalized metrics.
///
/// The [`MetricsStore`] is created here and shared by handle with every task;
/// it is only read for the final report after all tasks have been joined.
pub struct RunCoordinator {
    config: RunConfig,
    backends: Vec<Arc<dyn SearchBackend>>,
    metrics: Arc<MetricsStore>,
    seed: u64,
    states: Vec<StateHandle>,
}

impl RunCoordinator {
    /// Coordinator for the Elasticsearch and Solr backends named in `config`.
    pub fn new(config: RunConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let backends: Vec<Arc<dyn SearchBackend>> = vec![
            Arc::new(ElasticsearchBackend::new(
                client.clone(),
                &config.es_endpoint,
                &config.es_index,
            )),
            Arc::new(SolrBackend::new(client, &config.solr_endpoint, &config.solr_core)),
        ];

        Self::with_backends(config, backends)
    }

    /// Coordinator over arbitrary backends; each gets one index and one query
    /// worker.
    pub fn with_backends(
        config: RunConfig,
        backends: Vec<Arc<dyn SearchBackend>>,
    ) -> anyhow::Result<Self> {
        config.validate().context("Invalid run configuration")?;

        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let metrics = match config.max_latency_samples {
            Some(capacity) => MetricsStore::with_sample_capacity(capacity, seed),
            None => MetricsStore::new(),
        };

        Ok(Self {
            config,
            backends,
            metrics: Arc::new(metrics),
            seed,
            states: Vec::new(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Handle on the shared store, e.g. for observing a run from outside.
    pub fn metrics(&self) -> Arc<MetricsStore> {
        Arc::clone(&self.metrics)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// State handles of the workers started by the last run.
    pub fn worker_states(&self) -> &[StateHandle] {
        &self.states
    }

    /// Run for the configured duration.
    pub async fn run(&mut self) -> anyhow::Result<RunOutcome> {
        self.run_until(CancellationToken::new()).await
    }

    /// Run for the configured duration, or until `parent` is cancelled.
    pub async fn run_until(&mut self, parent: CancellationToken) -> anyhow::Result<RunOutcome> {
        let shutdown = parent.child_token();

        // Build every worker first so a bad rate fails before anything runs
        let mut workers = Vec::with_capacity(self.backends.len() * 2);
        for (i, backend) in self.backends.iter().enumerate() {
            for (j, (kind, rate)) in [
                (WorkerKind::Index, self.config.index_rate),
                (WorkerKind::Query, self.config.query_rate),
            ]
            .into_iter()
            .enumerate()
            {
                let stream = (i * 2 + j) as u64 + 1;
                let rng = StdRng::seed_from_u64(self.seed.wrapping_add(stream));
                workers.push(RateLimitedWorker::new(
                    kind,
                    Arc::clone(backend),
                    Arc::clone(&self.metrics),
                    rate,
                    self.config.bulk_size,
                    rng,
                )?);
            }
        }
        self.states = workers.iter().map(RateLimitedWorker::state).collect();

        let start = self.metrics.mark_started();
        let deadline =
            start
                .checked_add(self.config.duration)
                .ok_or(ConfigError::DurationTooLarge {
                    name: "Run duration",
                    duration: self.config.duration,
                })?;
        info!(
            "Starting {} workers for {:?} (seed {})",
            workers.len(),
            self.config.duration,
            self.seed
        );

        let handles: Vec<_> = workers
            .into_iter()
            .map(|worker| tokio::spawn(worker.run(shutdown.clone())))
            .collect();

        let reporter = self.config.stats_enabled.then(|| {
            StatsReporter::new(Arc::clone(&self.metrics), self.config.stats_interval)
                .spawn(shutdown.clone())
        });

        let cancelled_early = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => false,
            _ = shutdown.cancelled() => true,
        };
        shutdown.cancel();
        if cancelled_early {
            info!("Run cancelled before the configured duration elapsed");
        }

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.await.context("Worker task failed")?);
        }
        let snapshots = match reporter {
            Some(handle) => handle.await.context("Stats reporter task failed")?,
            None => 0,
        };

        self.metrics.mark_finished();
        let metrics = self.metrics.finalize();
        info!("All workers stopped after {:?}", metrics.elapsed);

        Ok(RunOutcome {
            metrics,
            workers: summaries,
            snapshots,
            cancelled_early,
            seed: self.seed,
        })
    }
}
