//! Self-observability reporting configuration
//!
//! Controls how the agent reports its own pipeline and sink counters.

use serde::Deserialize;
use std::time::Duration;

/// Metrics output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON structured output
    Json,
}

/// Metrics configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "5m"
/// format = "json"
/// include_sinks = false
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable periodic reporting
    /// Default: true
    pub enabled: bool,

    /// Reporting interval
    /// Default: 5m
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Output format (human, json)
    /// Default: human
    pub format: MetricsFormat,

    /// Include pipeline counters (cycles, rejections, expirations)
    /// Default: true
    pub include_pipeline: bool,

    /// Include per-sink counters (writes, errors, batches)
    /// Default: true
    pub include_sinks: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(300),
            format: MetricsFormat::Human,
            include_pipeline: true,
            include_sinks: true,
        }
    }
}
