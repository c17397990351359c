//! Harvest Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the queries and at least one sink have to be written down.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use harvest_config::Config;
//! use std::str::FromStr;
//!
//! let toml = r#"
//! [[queries]]
//! pattern = "system:type=Memory"
//! attributes = ["used"]
//!
//! [sinks.console]
//! type = "stdout"
//! "#;
//! let config = Config::from_str(toml).unwrap();
//! assert_eq!(config.queries.len(), 1);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [global]
//! period = "10s"
//! collection_workers = 2
//! delivery_workers = 4
//! shutdown_timeout = "5s"
//!
//! [log]
//! level = "info"
//!
//! [source]
//! type = "system"
//!
//! [[queries]]
//! pattern = "system:type=Cpu"
//! attributes = ["usage"]
//! alias = "cpu"
//! kind = "gauge"
//!
//! [sinks.console]
//! type = "stdout"
//! batch_size = 20
//! ```

mod error;
mod global;
mod logging;
mod metrics;
mod queries;
mod sinks;
mod sources;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use harvest_protocol::Query;
use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use queries::QueryConfig;
pub use sinks::{
    CircuitBreakerConfig, NullSinkConfig, RateSinkConfig, SinkConfig, SinksConfig,
    StdoutFormat, StdoutSinkConfig,
};
pub use sources::{SourceConfig, StaticEntityConfig, StaticSourceConfig, SystemSourceConfig};

/// Main configuration structure
///
/// All sections are optional with sensible defaults; validation still
/// requires at least one query and one enabled sink.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings (period, pool sizes, shutdown bound)
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Self-observability reporting
    pub metrics: MetricsConfig,

    /// Metric source
    pub source: SourceConfig,

    /// Queries evaluated every cycle
    pub queries: Vec<QueryConfig>,

    /// Named sinks receiving every result
    pub sinks: SinksConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Build the runtime queries in file order
    pub fn build_queries(&self) -> Result<Vec<Query>> {
        self.queries
            .iter()
            .enumerate()
            .map(|(index, q)| q.to_query(index))
            .collect()
    }

    /// Get list of enabled sink names, sorted
    pub fn enabled_sinks(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sinks
            .iter()
            .filter(|(_, sink)| sink.is_enabled())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
