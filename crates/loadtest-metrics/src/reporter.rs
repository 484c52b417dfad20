//! Periodic progress reporting.

use crate::snapshot::ProgressSnapshot;
use crate::store::MetricsStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Prints a progress snapshot of a [`MetricsStore`] on a fixed interval.
///
/// Read-only: the reporter never mutates the store. The first snapshot is
/// taken one interval after start; the reporter stops as soon as the shutdown
/// token is cancelled, without emitting a final line.
pub struct StatsReporter {
    metrics: Arc<MetricsStore>,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(metrics: Arc<MetricsStore>, interval: Duration) -> Self {
        Self { metrics, interval }
    }

    /// Run until `shutdown` is cancelled, printing each snapshot to stdout.
    ///
    /// Returns the number of snapshots emitted.
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        self.run_with(shutdown, |snapshot| println!("📊 {snapshot}"))
            .await
    }

    /// Run until `shutdown` is cancelled, handing each snapshot to `emit`.
    pub async fn run_with<F>(self, shutdown: CancellationToken, mut emit: F) -> u64
    where
        F: FnMut(&ProgressSnapshot),
    {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut emitted = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("Stats reporter stopping after {} snapshots", emitted);
                    break;
                }
                _ = ticker.tick() => {
                    let snapshot = self.metrics.snapshot();
                    emit(&snapshot);
                    emitted += 1;
                }
            }
        }

        emitted
    }

    /// Spawn the reporter as a background task that prints to stdout.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<u64> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reports_on_interval_until_cancelled() {
        let metrics = Arc::new(MetricsStore::new());
        metrics.mark_started();
        let shutdown = CancellationToken::new();

        let reporter = StatsReporter::new(Arc::clone(&metrics), Duration::from_secs(10));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = tokio::spawn(reporter.run_with(shutdown.clone(), move |snapshot| {
            let _ = tx.send(*snapshot);
        }));

        metrics.record_indexed(100, Duration::from_millis(5));
        tokio::time::sleep(Duration::from_secs(35)).await;
        shutdown.cancel();

        let emitted = handle.await.unwrap();
        assert_eq!(emitted, 3);

        let mut snapshots = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            snapshots.push(snapshot);
        }
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].elapsed, Duration::from_secs(10));
        assert_eq!(snapshots[2].elapsed, Duration::from_secs(30));
        assert!(snapshots
            .iter()
            .all(|s| s.counters.documents_indexed == 100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_first_interval_emits_nothing() {
        let metrics = Arc::new(MetricsStore::new());
        let shutdown = CancellationToken::new();

        let reporter = StatsReporter::new(metrics, Duration::from_secs(10));
        let handle = tokio::spawn(reporter.run_with(shutdown.clone(), |_| {}));

        tokio::time::sleep(Duration::from_secs(3)).await;
        shutdown.cancel();

        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_does_not_mutate_store() {
        let metrics = Arc::new(MetricsStore::new());
        metrics.mark_started();
        let shutdown = CancellationToken::new();

        let reporter = StatsReporter::new(Arc::clone(&metrics), Duration::from_millis(100));
        let handle = tokio::spawn(reporter.run_with(shutdown.clone(), |_| {}));

        tokio::time::sleep(Duration::from_secs(2)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(metrics.counters(), Default::default());
        assert_eq!(metrics.sample_counts(), (0, 0));
    }
}
