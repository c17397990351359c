//! Metric result types
//!
//! `MetricResult` is the value object produced by collection and consumed,
//! independently, by every configured sink.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Monotonically increasing value
    Counter,
    /// Point-in-time value
    Gauge,
    /// Not declared by the query
    #[default]
    Unknown,
}

impl MetricKind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Integral number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Point in time
    Timestamp(DateTime<Utc>),
    /// Free-form text
    Text(String),
}

impl MetricValue {
    /// Numeric view of the value
    ///
    /// Timestamps convert to epoch milliseconds; text is parsed when it
    /// holds a number and `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) if v.is_finite() => Some(*v),
            Self::Float(_) => None,
            Self::Timestamp(ts) => Some(ts.timestamp_millis() as f64),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    /// Whether the value is numeric (integer or float)
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Self::Float(v as f64), Self::Integer)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for MetricValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

/// A collected metric
///
/// Immutable once built. Fan-out to several sinks shares one instance
/// behind an `Arc`; sinks only ever see `&MetricResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    /// Fully qualified metric name
    name: String,

    /// Metric classification
    kind: MetricKind,

    /// Collected value
    value: MetricValue,

    /// Collection time in milliseconds since the Unix epoch
    epoch_millis: i64,
}

impl MetricResult {
    /// Create a new result
    pub fn new(
        name: impl Into<String>,
        kind: MetricKind,
        value: impl Into<MetricValue>,
        epoch_millis: i64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            epoch_millis,
        }
    }

    /// Metric name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metric kind
    #[inline]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Metric value
    #[inline]
    pub fn value(&self) -> &MetricValue {
        &self.value
    }

    /// Collection time (epoch milliseconds)
    #[inline]
    pub fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }
}

impl fmt::Display for MetricResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}={} ({})",
            self.epoch_millis, self.name, self.value, self.kind
        )
    }
}
