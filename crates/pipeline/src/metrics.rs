//! Pipeline metrics
//!
//! Counters for every stage, shared by the generator, both stages and the
//! coordinator. All operations use relaxed ordering; values are eventually
//! consistent.

use std::sync::Arc;

use harvest_metrics::{Counter, PipelineMetricsProvider, PipelineSnapshot};

/// Counters of one pipeline instance
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Generator wake-ups
    pub cycles: Counter,

    /// Queries accepted by the collection pool
    pub queries_submitted: Counter,
    /// Queries refused by the collection pool
    pub queries_rejected: Counter,
    /// Queries dropped at a worker because the cycle deadline had passed
    pub queries_expired: Counter,
    /// Queries the source could not answer
    pub queries_failed: Counter,
    /// Matched entities that could not be read
    pub entity_failures: Counter,
    /// Results built from samples
    pub results_collected: Counter,

    /// Deliveries accepted by the delivery pool
    pub deliveries_submitted: Counter,
    /// Deliveries refused by the delivery pool
    pub deliveries_rejected: Counter,
    /// Deliveries dropped at a worker because the cycle deadline had passed
    pub deliveries_expired: Counter,
    /// Deliveries the sink accepted
    pub deliveries_succeeded: Counter,
    /// Deliveries that raised an error
    pub deliveries_failed: Counter,
}

impl PipelineMetrics {
    /// Create metrics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            cycles: self.cycles.get(),
            queries_submitted: self.queries_submitted.get(),
            queries_rejected: self.queries_rejected.get(),
            queries_expired: self.queries_expired.get(),
            queries_failed: self.queries_failed.get(),
            entity_failures: self.entity_failures.get(),
            results_collected: self.results_collected.get(),
            deliveries_submitted: self.deliveries_submitted.get(),
            deliveries_rejected: self.deliveries_rejected.get(),
            deliveries_expired: self.deliveries_expired.get(),
            deliveries_succeeded: self.deliveries_succeeded.get(),
            deliveries_failed: self.deliveries_failed.get(),
        }
    }
}

/// Handle for reading pipeline metrics from the reporter
///
/// Stays valid after the coordinator that created it has stopped.
#[derive(Debug, Clone)]
pub struct PipelineMetricsHandle {
    metrics: Arc<PipelineMetrics>,
}

impl PipelineMetricsHandle {
    pub(crate) fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self { metrics }
    }
}

impl PipelineMetricsProvider for PipelineMetricsHandle {
    fn pipeline_snapshot(&self) -> PipelineSnapshot {
        self.metrics.snapshot()
    }
}
