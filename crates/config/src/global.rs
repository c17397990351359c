//! Global configuration settings
//!
//! Collection period, worker pool sizing and shutdown bound.

use serde::Deserialize;
use std::time::Duration;

/// Global configuration that applies to the whole pipeline
///
/// All fields have sensible defaults - you only need to specify what you want to change.
///
/// # Example
///
/// ```toml
/// [global]
/// period = "15s"
/// collection_workers = 4
/// delivery_queue = 5000
/// shutdown_timeout = "5s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Interval between collection cycles
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub period: Duration,

    /// Number of collection workers
    /// Default: 2
    pub collection_workers: usize,

    /// Collection queue capacity (pending queries)
    /// Default: 1000
    pub collection_queue: usize,

    /// Number of delivery workers
    /// Default: 2
    pub delivery_workers: usize,

    /// Delivery queue capacity (pending result writes)
    /// Default: 1000
    pub delivery_queue: usize,

    /// Upper bound on the whole shutdown sequence
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
            collection_workers: 2,
            collection_queue: 1000,
            delivery_workers: 2,
            delivery_queue: 1000,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GlobalConfig::default();
        assert_eq!(config.period, Duration::from_secs(60));
        assert_eq!(config.collection_workers, 2);
        assert_eq!(config.collection_queue, 1000);
        assert_eq!(config.delivery_workers, 2);
        assert_eq!(config.delivery_queue, 1000);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
period = "15s"
delivery_workers = 8
"#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.period, Duration::from_secs(15));
        assert_eq!(config.delivery_workers, 8);
        // Defaults still apply
        assert_eq!(config.collection_workers, 2);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
period = "500ms"
collection_workers = 3
collection_queue = 10
delivery_workers = 4
delivery_queue = 20
shutdown_timeout = "2s"
"#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.period, Duration::from_millis(500));
        assert_eq!(config.collection_workers, 3);
        assert_eq!(config.collection_queue, 10);
        assert_eq!(config.delivery_workers, 4);
        assert_eq!(config.delivery_queue, 20);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(2));
    }
}
