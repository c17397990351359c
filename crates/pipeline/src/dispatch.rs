//! Result dispatch stage
//!
//! Delivers one result to one sink on the delivery pool. Each delivery is
//! independent: a slow or failing sink only affects its own deliveries.
//!
//! A delivery runs `pre_collect`, `write` and `post_collect` on the sink.
//! `post_collect` runs even when the earlier calls failed, so sinks can
//! rely on it to release per-delivery state.

use std::sync::Arc;

use harvest_protocol::{Clock, MetricResult};
use harvest_sinks::MetricSink;
use tracing::warn;

use crate::deadline::{Deadline, DeadlineTask};
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::pool::WorkerPool;

/// Submits result deliveries to the delivery pool
#[derive(Clone)]
pub struct ResultDispatchStage {
    pool: Arc<WorkerPool>,
    clock: Arc<dyn Clock>,
    metrics: Arc<PipelineMetrics>,
}

impl ResultDispatchStage {
    /// Create a stage submitting to `pool`
    pub fn new(pool: Arc<WorkerPool>, clock: Arc<dyn Clock>, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            pool,
            clock,
            metrics,
        }
    }

    /// Queue the delivery of `result` to `sink`
    ///
    /// The delivery is dropped unrun if it reaches a worker after
    /// `deadline`. Sink errors are logged and counted, never returned.
    ///
    /// # Errors
    ///
    /// `Rejected` or `PoolShutdown` when the delivery pool refuses the task.
    pub fn write_result(
        &self,
        deadline: Deadline,
        result: Arc<MetricResult>,
        sink: Arc<dyn MetricSink>,
    ) -> Result<()> {
        let metrics = Arc::clone(&self.metrics);
        let task = DeadlineTask::new(
            deadline,
            Arc::clone(&self.clock),
            deliver(result, sink, Arc::clone(&self.metrics)),
        )
        .with_label("delivery");

        let submitted = self.pool.submit(async move {
            if !task.run().await {
                metrics.deliveries_expired.inc();
            }
        });

        match submitted {
            Ok(()) => self.metrics.deliveries_submitted.inc(),
            Err(_) => self.metrics.deliveries_rejected.inc(),
        }
        submitted
    }
}

async fn deliver(result: Arc<MetricResult>, sink: Arc<dyn MetricSink>, metrics: Arc<PipelineMetrics>) {
    let mut failed = false;

    let written = match sink.pre_collect().await {
        Ok(()) => sink.write(&result).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        failed = true;
        warn!(
            sink = %sink.name(),
            metric = %result.name(),
            error = %e,
            "delivery failed"
        );
    }

    if let Err(e) = sink.post_collect().await {
        failed = true;
        warn!(sink = %sink.name(), error = %e, "post-collect failed");
    }

    if failed {
        metrics.deliveries_failed.inc();
    } else {
        metrics.deliveries_succeeded.inc();
    }
}

impl std::fmt::Debug for ResultDispatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultDispatchStage")
            .field("pool", &self.pool.name())
            .finish()
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod dispatch_test;
