//! Null sink - discards all data
//!
//! Counts what it receives and drops it. Useful for measuring collection
//! throughput without any output cost, and as a placeholder destination
//! while wiring a configuration.

use std::sync::Arc;

use async_trait::async_trait;
use harvest_metrics::SinkMetrics;
use harvest_protocol::MetricResult;

use crate::error::Result;
use crate::metrics::SinkMetricsHandle;
use crate::traits::{BatchSink, MetricSink};

/// Sink type name
pub const SINK_TYPE: &str = "null";

/// Sink that discards every result
#[derive(Debug)]
pub struct NullSink {
    name: String,
    metrics: Arc<SinkMetrics>,
}

impl NullSink {
    /// Create a named null sink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Counters of this sink
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle for the metrics reporter
    pub fn metrics_handle(&self) -> SinkMetricsHandle {
        SinkMetricsHandle::new(&self.name, SINK_TYPE, self.metrics())
    }
}

#[async_trait]
impl MetricSink for NullSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &'static str {
        SINK_TYPE
    }

    async fn write(&self, _result: &MetricResult) -> Result<usize> {
        self.metrics.record_written(1);
        Ok(1)
    }
}

impl BatchSink for NullSink {}
