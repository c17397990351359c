//! Harvest - Metrics
//!
//! Internal counters and periodic reporting for the agent itself.
//!
//! # Overview
//!
//! This crate provides:
//! - Atomic counters for per-sink delivery statistics
//! - Provider traits so the pipeline and sinks can expose snapshots
//! - A unified reporter with configurable output formats (human, JSON)
//!
//! # Metrics Handle Pattern
//!
//! Components keep their counters in an `Arc` and hand out a lightweight
//! handle implementing the matching provider trait. The handle stays valid
//! for as long as the reporter needs it, independent of the component.
//!
//! ```text
//! Component (owns Arc<Metrics>)
//!     │
//!     └──► metrics_handle() → Handle (clones Arc, implements Provider trait)
//!
//! Agent wiring:
//!     1. Build sinks and pipeline
//!     2. Collect metrics handles into Vec<Arc<dyn Provider>>
//!     3. UnifiedReporter::new(config, pipeline, sinks), then spawn run()
//! ```
//!
//! # Metric Categories
//!
//! - **Pipeline**: cycles, submissions, rejections, expirations, failures
//! - **Sinks**: results written, write errors, batches flushed, skipped writes

mod collected;
pub mod format;
mod reporter;
mod traits;

pub use collected::{
    CollectedMetrics, CollectedSink, MetricsRates, PipelineRates, PipelineSnapshot, SinkRates,
};
pub use format::{HumanFormatter, JsonFormatter, MetricsFormatter};
pub use reporter::UnifiedReporter;
pub use traits::{PipelineMetricsProvider, SinkMetrics, SinkMetricsProvider, SinkMetricsSnapshot};

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter wrapper for convenient metric operations
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Create a new counter initialized to 0
    #[inline]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increment the counter by `val` (relaxed ordering for performance)
    #[inline]
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Increment the counter by 1
    #[inline]
    pub fn inc(&self) {
        self.add(1);
    }

    /// Get the current value (relaxed ordering)
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
