//! Reporter handle for sink counters

use std::sync::Arc;

use harvest_metrics::{SinkMetrics, SinkMetricsProvider, SinkMetricsSnapshot};

/// Lightweight handle exposing one sink's counters to the reporter
///
/// Decorators share the same `Arc<SinkMetrics>` as the sink they wrap,
/// so one handle covers the whole assembled chain.
#[derive(Debug, Clone)]
pub struct SinkMetricsHandle {
    name: String,
    sink_type: &'static str,
    metrics: Arc<SinkMetrics>,
}

impl SinkMetricsHandle {
    /// Create a handle for a named sink
    pub fn new(name: impl Into<String>, sink_type: &'static str, metrics: Arc<SinkMetrics>) -> Self {
        Self {
            name: name.into(),
            sink_type,
            metrics,
        }
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }
}

impl SinkMetricsProvider for SinkMetricsHandle {
    fn sink_name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &str {
        self.sink_type
    }

    fn snapshot(&self) -> SinkMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_reads_shared_counters() {
        let metrics = Arc::new(SinkMetrics::new());
        let handle = SinkMetricsHandle::new("console", "stdout", Arc::clone(&metrics));

        metrics.record_written(4);
        metrics.record_skipped();

        assert_eq!(handle.sink_name(), "console");
        assert_eq!(handle.sink_type(), "stdout");
        assert_eq!(handle.snapshot().results_written, 4);
        assert_eq!(handle.snapshot().skipped, 1);
    }
}
