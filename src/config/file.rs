//! TOML configuration file.

use super::{parse_duration, ConfigError, RunConfig};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Contents of a `--config` TOML file. Every key is optional.
///
/// ```toml
/// index_rate = 20
/// query_rate = 10
/// duration = "5m"
/// bulk_size = 50
///
/// [elasticsearch]
/// endpoint = "http://localhost:9200"
/// index = "performance_baseline"
///
/// [solr]
/// endpoint = "http://localhost:8983"
/// core = "performance_baseline"
///
/// [stats]
/// enabled = true
/// interval = "10s"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub index_rate: Option<f64>,
    pub query_rate: Option<f64>,
    pub duration: Option<String>,
    pub bulk_size: Option<usize>,
    pub request_timeout: Option<String>,
    pub seed: Option<u64>,
    pub max_latency_samples: Option<usize>,
    #[serde(default)]
    pub elasticsearch: ElasticsearchSection,
    #[serde(default)]
    pub solr: SolrSection,
    #[serde(default)]
    pub stats: StatsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElasticsearchSection {
    pub endpoint: Option<String>,
    pub index: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolrSection {
    pub endpoint: Option<String>,
    pub core: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsSection {
    pub enabled: Option<bool>,
    pub interval: Option<String>,
}

impl ConfigFile {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overlay the values present in the file onto `config`.
    pub fn apply(&self, config: &mut RunConfig) -> Result<(), ConfigError> {
        if let Some(rate) = self.index_rate {
            config.index_rate = rate;
        }
        if let Some(rate) = self.query_rate {
            config.query_rate = rate;
        }
        if let Some(duration) = &self.duration {
            config.duration = parse_field("duration", duration)?;
        }
        if let Some(bulk_size) = self.bulk_size {
            config.bulk_size = bulk_size;
        }
        if let Some(timeout) = &self.request_timeout {
            config.request_timeout = parse_field("request_timeout", timeout)?;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_latency_samples.is_some() {
            config.max_latency_samples = self.max_latency_samples;
        }
        if let Some(endpoint) = &self.elasticsearch.endpoint {
            config.es_endpoint = endpoint.clone();
        }
        if let Some(index) = &self.elasticsearch.index {
            config.es_index = index.clone();
        }
        if let Some(endpoint) = &self.solr.endpoint {
            config.solr_endpoint = endpoint.clone();
        }
        if let Some(core) = &self.solr.core {
            config.solr_core = core.clone();
        }
        if let Some(enabled) = self.stats.enabled {
            config.stats_enabled = enabled;
        }
        if let Some(interval) = &self.stats.interval {
            config.stats_interval = parse_field("stats.interval", interval)?;
        }
        Ok(())
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    parse_duration(value).map_err(|e| ConfigError::InvalidDuration {
        field,
        message: format!("{e:#}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_apply_full_file() {
        let file = ConfigFile::from_toml(
            r#"
index_rate = 20
query_rate = 2.5
duration = "5m"
bulk_size = 50
request_timeout = "2s"
seed = 7
max_latency_samples = 10000

[elasticsearch]
endpoint = "http://es:9200"
index = "lab"

[solr]
endpoint = "http://solr:8983"
core = "lab_core"

[stats]
enabled = false
interval = "500ms"
"#,
        )
        .unwrap();

        let mut config = RunConfig::default();
        file.apply(&mut config).unwrap();

        assert_eq!(config.index_rate, 20.0);
        assert_eq!(config.query_rate, 2.5);
        assert_eq!(config.duration, Duration::from_secs(300));
        assert_eq!(config.bulk_size, 50);
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_latency_samples, Some(10_000));
        assert_eq!(config.es_endpoint, "http://es:9200");
        assert_eq!(config.es_index, "lab");
        assert_eq!(config.solr_endpoint, "http://solr:8983");
        assert_eq!(config.solr_core, "lab_core");
        assert!(!config.stats_enabled);
        assert_eq!(config.stats_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = ConfigFile::from_toml("query_rate = 1\n").unwrap();

        let mut config = RunConfig::default();
        file.apply(&mut config).unwrap();

        let expected = RunConfig {
            query_rate: 1.0,
            ..Default::default()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ConfigFile::from_toml("index_rat = 5\n").is_err());
    }

    #[test]
    fn test_invalid_duration_is_reported_with_field() {
        let file = ConfigFile::from_toml("duration = \"soon\"\n").unwrap();

        let err = file.apply(&mut RunConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDuration {
                field: "duration",
                ..
            }
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "bulk_size = 25").unwrap();

        let file = ConfigFile::load(tmp.path()).unwrap();
        assert_eq!(file.bulk_size, Some(25));

        let missing = ConfigFile::load(Path::new("/nonexistent/loadtest.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
