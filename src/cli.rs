//! Command-line argument definitions.

use crate::config::{parse_duration, RunConfig};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Output format for the final report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable sections with a per-worker table
    #[default]
    Text,
    /// Markdown document
    Markdown,
    /// JSON object
    Json,
}

/// Arguments of a load test run.
///
/// Every value is optional so that flags only override what they name; see
/// [`RunConfig::resolve`] for the layering order.
#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "LOADTEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bulk requests per second sent to each backend
    #[arg(long, env = "LOADTEST_INDEX_RATE")]
    pub index_rate: Option<f64>,

    /// Queries per second sent to each backend
    #[arg(long, env = "LOADTEST_QUERY_RATE")]
    pub query_rate: Option<f64>,

    /// Run duration (e.g. "60", "90s", "5m", "1h")
    #[arg(long, short = 'd', env = "LOADTEST_DURATION", value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Elasticsearch base URL
    #[arg(long, env = "LOADTEST_ES_ENDPOINT")]
    pub es_endpoint: Option<String>,

    /// Solr base URL
    #[arg(long, env = "LOADTEST_SOLR_ENDPOINT")]
    pub solr_endpoint: Option<String>,

    /// Elasticsearch index name
    #[arg(long, env = "LOADTEST_ES_INDEX")]
    pub es_index: Option<String>,

    /// Solr core name
    #[arg(long, env = "LOADTEST_SOLR_CORE")]
    pub solr_core: Option<String>,

    /// Documents per bulk request
    #[arg(long, env = "LOADTEST_BULK_SIZE")]
    pub bulk_size: Option<usize>,

    /// Disable periodic progress lines
    #[arg(long)]
    pub no_stats: bool,

    /// Interval between progress lines (e.g. "10s")
    #[arg(long, env = "LOADTEST_STATS_INTERVAL", value_parser = parse_duration)]
    pub stats_interval: Option<Duration>,

    /// Per-request HTTP timeout (e.g. "30s")
    #[arg(long, env = "LOADTEST_REQUEST_TIMEOUT", value_parser = parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Random seed for payloads and query selection (same seed = same payloads)
    #[arg(long, env = "LOADTEST_SEED")]
    pub seed: Option<u64>,

    /// Keep at most this many latency samples per operation class (reservoir sampling)
    #[arg(long, env = "LOADTEST_MAX_LATENCY_SAMPLES")]
    pub max_latency_samples: Option<usize>,
}

impl RunArgs {
    /// Overlay the values given on the command line onto `config`.
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(rate) = self.index_rate {
            config.index_rate = rate;
        }
        if let Some(rate) = self.query_rate {
            config.query_rate = rate;
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if let Some(endpoint) = &self.es_endpoint {
            config.es_endpoint = endpoint.clone();
        }
        if let Some(endpoint) = &self.solr_endpoint {
            config.solr_endpoint = endpoint.clone();
        }
        if let Some(index) = &self.es_index {
            config.es_index = index.clone();
        }
        if let Some(core) = &self.solr_core {
            config.solr_core = core.clone();
        }
        if let Some(bulk_size) = self.bulk_size {
            config.bulk_size = bulk_size;
        }
        if self.no_stats {
            config.stats_enabled = false;
        }
        if let Some(interval) = self.stats_interval {
            config.stats_interval = interval;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_latency_samples.is_some() {
            config.max_latency_samples = self.max_latency_samples;
        }
    }
}
