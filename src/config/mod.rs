//! Run configuration.
//!
//! A [`RunConfig`] is resolved once at startup from three layers, later
//! layers overriding earlier ones:
//!
//! 1. built-in defaults ([`RunConfig::default`])
//! 2. an optional TOML file ([`ConfigFile`])
//! 3. command-line flags and `LOADTEST_*` environment variables
//!
//! The result is validated before any worker is scheduled.

mod duration;
mod file;

pub use duration::parse_duration;
pub use file::ConfigFile;

use crate::cli::RunArgs;
use reqwest::Url;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Errors that prevent a run from starting.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a positive number of operations per second, got {value}")]
    NonPositiveRate { name: &'static str, value: f64 },

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("{name} of {duration:?} is too large to schedule")]
    DurationTooLarge {
        name: &'static str,
        duration: Duration,
    },

    #[error("Bulk size must be at least 1")]
    ZeroBulkSize,

    #[error("Latency sample cap must be at least 1")]
    ZeroSampleCapacity,

    #[error("Invalid {name} '{url}': {reason}")]
    InvalidEndpoint {
        name: &'static str,
        url: String,
        reason: String,
    },

    #[error("{name} must not be empty")]
    EmptyName { name: &'static str },

    #[error("Invalid duration for {field}: {message}")]
    InvalidDuration { field: &'static str, message: String },

    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Immutable configuration of one load test run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    /// Bulk requests per second, per backend.
    pub index_rate: f64,
    /// Queries per second, per backend.
    pub query_rate: f64,
    /// How long the run lasts.
    pub duration: Duration,
    /// Elasticsearch base address.
    pub es_endpoint: String,
    /// Solr base address.
    pub solr_endpoint: String,
    /// Elasticsearch index receiving writes and queries.
    pub es_index: String,
    /// Solr core receiving writes and queries.
    pub solr_core: String,
    /// Documents per bulk request.
    pub bulk_size: usize,
    /// Whether the periodic progress reporter runs.
    pub stats_enabled: bool,
    /// Time between progress lines.
    pub stats_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Seed for payload and query selection; random when unset.
    pub seed: Option<u64>,
    /// Reservoir size per latency class; unbounded when unset.
    pub max_latency_samples: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            index_rate: 10.0,
            query_rate: 5.0,
            duration: Duration::from_secs(60),
            es_endpoint: "http://localhost:9199".to_string(),
            solr_endpoint: "http://localhost:8999".to_string(),
            es_index: "performance_baseline".to_string(),
            solr_core: "performance_baseline".to_string(),
            bulk_size: 10,
            stats_enabled: true,
            stats_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            seed: None,
            max_latency_samples: None,
        }
    }
}

impl RunConfig {
    /// Resolve the configuration from defaults, the optional config file and
    /// command-line arguments, then validate it.
    pub fn resolve(args: &RunArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = &args.config {
            ConfigFile::load(path)?.apply(&mut config)?;
        }
        args.apply(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Check every invariant a run depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rate("index rate", self.index_rate)?;
        validate_rate("query rate", self.query_rate)?;

        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "Run duration",
            });
        }
        if self.bulk_size == 0 {
            return Err(ConfigError::ZeroBulkSize);
        }
        if self.stats_enabled && self.stats_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "Stats interval",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "Request timeout",
            });
        }
        validate_schedulable("Run duration", self.duration)?;
        validate_schedulable("Request timeout", self.request_timeout)?;
        if self.stats_enabled {
            validate_schedulable("Stats interval", self.stats_interval)?;
        }

        if self.max_latency_samples == Some(0) {
            return Err(ConfigError::ZeroSampleCapacity);
        }

        validate_endpoint("Elasticsearch endpoint", &self.es_endpoint)?;
        validate_endpoint("Solr endpoint", &self.solr_endpoint)?;

        if self.es_index.trim().is_empty() {
            return Err(ConfigError::EmptyName {
                name: "Elasticsearch index",
            });
        }
        if self.solr_core.trim().is_empty() {
            return Err(ConfigError::EmptyName { name: "Solr core" });
        }

        Ok(())
    }

    /// Number of documents a full run is expected to index, as used by the
    /// efficiency figures of the final report.
    pub fn expected_indexed(&self) -> f64 {
        self.index_rate * self.duration.as_secs_f64()
    }

    /// Number of queries a full run is expected to execute.
    pub fn expected_queries(&self) -> f64 {
        self.query_rate * self.duration.as_secs_f64()
    }
}

fn validate_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveRate { name, value })
    }
}

/// A timer deadline of `now + duration` must be representable.
fn validate_schedulable(name: &'static str, duration: Duration) -> Result<(), ConfigError> {
    match Instant::now().checked_add(duration) {
        Some(_) => Ok(()),
        None => Err(ConfigError::DurationTooLarge { name, duration }),
    }
}

fn validate_endpoint(name: &'static str, url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidEndpoint {
        name,
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::InvalidEndpoint {
            name,
            url: url.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        config.validate().unwrap();

        assert_eq!(config.index_rate, 10.0);
        assert_eq!(config.query_rate, 5.0);
        assert_eq!(config.duration, Duration::from_secs(60));
        assert_eq!(config.bulk_size, 10);
        assert!(config.stats_enabled);
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = RunConfig {
                index_rate: bad,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NonPositiveRate {
                    name: "index rate",
                    ..
                })
            ));

            let config = RunConfig {
                query_rate: bad,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::NonPositiveRate {
                    name: "query rate",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_rejects_zero_duration_and_bulk_size() {
        let config = RunConfig {
            duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration { .. })
        ));

        let config = RunConfig {
            bulk_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBulkSize)));
    }

    #[test]
    fn test_stats_interval_only_checked_when_enabled() {
        let config = RunConfig {
            stats_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = RunConfig {
            stats_enabled: false,
            stats_interval: Duration::ZERO,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        let config = RunConfig {
            es_endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));

        let config = RunConfig {
            solr_endpoint: "ftp://localhost:8983".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn test_rejects_durations_too_large_to_schedule() {
        let config = RunConfig {
            duration: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationTooLarge {
                name: "Run duration",
                ..
            })
        ));

        let config = RunConfig {
            request_timeout: Duration::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationTooLarge {
                name: "Request timeout",
                ..
            })
        ));

        let config = RunConfig {
            stats_interval: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        // Not scheduled when stats are off
        let config = RunConfig {
            stats_enabled: false,
            stats_interval: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        config.validate().unwrap();

        // A year is fine
        let config = RunConfig {
            duration: Duration::from_secs(365 * 24 * 3600),
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_sample_cap() {
        let config = RunConfig {
            max_latency_samples: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroSampleCapacity)
        ));
    }

    #[test]
    fn test_expected_counts() {
        let config = RunConfig {
            index_rate: 10.0,
            query_rate: 5.0,
            duration: Duration::from_secs(10),
            ..Default::default()
        };

        assert_eq!(config.expected_indexed(), 100.0);
        assert_eq!(config.expected_queries(), 50.0);
    }
}
