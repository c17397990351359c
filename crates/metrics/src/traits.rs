//! Sink metrics and the provider traits
//!
//! Sinks keep an `Arc<SinkMetrics>` and expose it to the reporter through
//! a handle implementing `SinkMetricsProvider`. The pipeline does the same
//! through `PipelineMetricsProvider`.

use crate::{Counter, PipelineSnapshot};

/// Delivery statistics of one sink
///
/// All fields use atomics for lock-free updates.
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Results successfully written
    pub results_written: Counter,
    /// Failed writes (including pre/post collect failures)
    pub write_errors: Counter,
    /// Batch windows flushed
    pub batches_flushed: Counter,
    /// Calls skipped while the circuit was open
    pub skipped: Counter,
}

impl SinkMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            results_written: Counter::new(),
            write_errors: Counter::new(),
            batches_flushed: Counter::new(),
            skipped: Counter::new(),
        }
    }

    /// Record successfully written results
    #[inline]
    pub fn record_written(&self, results: u64) {
        self.results_written.add(results);
    }

    /// Record a failed call
    #[inline]
    pub fn record_error(&self) {
        self.write_errors.inc();
    }

    /// Record a flushed batch window
    #[inline]
    pub fn record_batch(&self) {
        self.batches_flushed.inc();
    }

    /// Record a call skipped by an open circuit
    #[inline]
    pub fn record_skipped(&self) {
        self.skipped.inc();
    }

    /// Take a snapshot of current values
    #[inline]
    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            results_written: self.results_written.get(),
            write_errors: self.write_errors.get(),
            batches_flushed: self.batches_flushed.get(),
            skipped: self.skipped.get(),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SinkMetricsSnapshot {
    pub results_written: u64,
    pub write_errors: u64,
    pub batches_flushed: u64,
    pub skipped: u64,
}

/// Trait for sinks to provide metrics to the reporter
pub trait SinkMetricsProvider: Send + Sync {
    /// Configured sink name
    fn sink_name(&self) -> &str;

    /// Sink type (e.g., "stdout", "null", "rate")
    fn sink_type(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> SinkMetricsSnapshot;
}

/// Trait for the pipeline to provide its counters to the reporter
pub trait PipelineMetricsProvider: Send + Sync {
    /// Get a snapshot of pipeline metrics
    fn pipeline_snapshot(&self) -> PipelineSnapshot;
}
