//! Sink configuration types
//!
//! Sinks are named instances, so several sinks of the same type can run
//! side by side (e.g. a plain stdout sink next to a rate sink that also
//! writes to stdout).
//!
//! Every sink shares the delivery options `enabled`, `batch_size` and
//! `circuit_breaker`; the assembled sink is
//! `BatchDispatcher(CircuitBreaker(sink))` with batching only when
//! `batch_size > 0`.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Container for all sink configurations
///
/// # Example
///
/// ```toml
/// [sinks.console]
/// type = "stdout"
/// batch_size = 100
///
/// [sinks.discard]
/// type = "null"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    /// Named sink instances
    #[serde(flatten)]
    sinks: HashMap<String, SinkConfig>,
}

impl SinksConfig {
    /// Get a sink by name
    pub fn get(&self, name: &str) -> Option<&SinkConfig> {
        self.sinks.get(name)
    }

    /// Iterate over all sinks
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SinkConfig)> {
        self.sinks.iter()
    }

    /// Get the number of configured sinks
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if no sinks are configured
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Insert or replace a sink
    pub fn insert(&mut self, name: impl Into<String>, config: SinkConfig) {
        self.sinks.insert(name.into(), config);
    }
}

/// Configuration for a single sink instance
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Discards every result
    Null(NullSinkConfig),

    /// Writes results to standard output
    Stdout(StdoutSinkConfig),

    /// Derives per-second rates and forwards them to a nested sink
    Rate(RateSinkConfig),
}

impl SinkConfig {
    /// Check if the sink is enabled
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Null(c) => c.enabled,
            Self::Stdout(c) => c.enabled,
            Self::Rate(c) => c.enabled,
        }
    }

    /// Get the sink type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null(_) => "null",
            Self::Stdout(_) => "stdout",
            Self::Rate(_) => "rate",
        }
    }

    /// Window size of the batch dispatcher (0 disables batching)
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Null(c) => c.batch_size,
            Self::Stdout(c) => c.batch_size,
            Self::Rate(c) => c.batch_size,
        }
    }

    /// Circuit breaker settings
    pub fn circuit_breaker(&self) -> &CircuitBreakerConfig {
        match self {
            Self::Null(c) => &c.circuit_breaker,
            Self::Stdout(c) => &c.circuit_breaker,
            Self::Rate(c) => &c.circuit_breaker,
        }
    }
}

/// Circuit breaker settings for one sink
///
/// # Example
///
/// ```toml
/// [sinks.console.circuit_breaker]
/// max_failures = 3
/// disable_duration = "30s"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// When false, failures never disable the sink
    /// Default: true
    pub enabled: bool,

    /// Consecutive failures before the sink is disabled
    /// Default: 5
    pub max_failures: u32,

    /// How long a tripped sink stays disabled
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub disable_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failures: 5,
            disable_duration: Duration::from_secs(60),
        }
    }
}

/// Null sink configuration - discards all data
///
/// Useful for measuring pipeline throughput.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NullSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Batch window size
    /// Default: 0 (unbatched)
    pub batch_size: usize,

    /// Circuit breaker settings
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for NullSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 0,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Line format of the stdout sink
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StdoutFormat {
    /// `epoch_millis name value kind` (default)
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

/// Stdout sink configuration
///
/// # Example
///
/// ```toml
/// [sinks.console]
/// type = "stdout"
/// format = "json"
/// batch_size = 50
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StdoutSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Line format
    /// Default: plain
    pub format: StdoutFormat,

    /// Colorize plain output
    /// Default: false
    pub color: bool,

    /// Batch window size
    /// Default: 0 (unbatched)
    pub batch_size: usize,

    /// Circuit breaker settings
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for StdoutSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: StdoutFormat::Plain,
            color: false,
            batch_size: 0,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Rate sink configuration
///
/// Keeps the last `window` values of every metric name and emits
/// `<name>.rate` (units per second) to `output`.
///
/// # Example
///
/// ```toml
/// [sinks.cpu_rate]
/// type = "rate"
/// window = 4
///
/// [sinks.cpu_rate.output]
/// type = "stdout"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateSinkConfig {
    /// Whether this sink is enabled
    /// Default: true
    pub enabled: bool,

    /// Values kept per metric name
    /// Default: 2
    pub window: usize,

    /// Sink receiving the derived rates
    /// Default: stdout
    pub output: Box<SinkConfig>,

    /// Batch window size
    /// Default: 0 (unbatched)
    pub batch_size: usize,

    /// Circuit breaker settings
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for RateSinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 2,
            output: Box::new(SinkConfig::Stdout(StdoutSinkConfig::default())),
            batch_size: 0,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}
