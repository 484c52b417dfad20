//! Point-in-time views of the run counters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Values of the four run counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub documents_indexed: u64,
    pub indexing_errors: u64,
    pub queries_executed: u64,
    pub query_errors: u64,
}

impl Counters {
    /// Whether any operation failed.
    pub fn has_errors(&self) -> bool {
        self.indexing_errors > 0 || self.query_errors > 0
    }
}

/// Progress snapshot printed by the stats reporter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Time since the run started.
    pub elapsed: Duration,
    pub counters: Counters,
}

impl ProgressSnapshot {
    /// Documents indexed per second so far.
    pub fn indexed_per_second(&self) -> f64 {
        per_second(self.counters.documents_indexed, self.elapsed)
    }

    /// Queries executed per second so far.
    pub fn queries_per_second(&self) -> f64 {
        per_second(self.counters.queries_executed, self.elapsed)
    }
}

impl std::fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Stats @ {:.0}s: Indexed={} ({:.1}/s), Queries={} ({:.1}/s), Errors: Index={}, Query={}",
            self.elapsed.as_secs_f64(),
            self.counters.documents_indexed,
            self.indexed_per_second(),
            self.counters.queries_executed,
            self.queries_per_second(),
            self.counters.indexing_errors,
            self.counters.query_errors,
        )
    }
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        count as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let snapshot = ProgressSnapshot {
            elapsed: Duration::from_secs(10),
            counters: Counters {
                documents_indexed: 1000,
                indexing_errors: 0,
                queries_executed: 50,
                query_errors: 0,
            },
        };

        assert_eq!(snapshot.indexed_per_second(), 100.0);
        assert_eq!(snapshot.queries_per_second(), 5.0);
    }

    #[test]
    fn test_rates_zero_elapsed() {
        let snapshot = ProgressSnapshot {
            elapsed: Duration::ZERO,
            counters: Counters {
                documents_indexed: 1000,
                ..Default::default()
            },
        };

        assert_eq!(snapshot.indexed_per_second(), 0.0);
        assert!(snapshot.queries_per_second().is_finite());
    }

    #[test]
    fn test_display_line() {
        let snapshot = ProgressSnapshot {
            elapsed: Duration::from_secs(20),
            counters: Counters {
                documents_indexed: 400,
                indexing_errors: 2,
                queries_executed: 100,
                query_errors: 1,
            },
        };

        assert_eq!(
            snapshot.to_string(),
            "Stats @ 20s: Indexed=400 (20.0/s), Queries=100 (5.0/s), Errors: Index=2, Query=1"
        );
    }

    #[test]
    fn test_has_errors() {
        assert!(!Counters::default().has_errors());
        assert!(Counters {
            query_errors: 1,
            ..Default::default()
        }
        .has_errors());
    }
}
