//! Collection stage
//!
//! Runs one query against the metric source on the collection pool, turns
//! every sample into a `MetricResult` and hands each result to every sink
//! through the dispatch stage.
//!
//! ```text
//! query ──► source.query_attributes ──► samples ──► MetricResult ──┬─► sink A
//!                                   └─► entity failures (logged)   └─► sink B
//! ```
//!
//! A query that fails as a whole is logged and dropped for this cycle. A
//! delivery the dispatch stage refuses is logged; the other deliveries of
//! the same query still go out.

use std::sync::Arc;

use harvest_protocol::{Clock, MetricResult, Query};
use harvest_sinks::util::RateLimitedLogger;
use harvest_sources::MetricSource;
use tracing::{debug, warn};

use crate::deadline::{Deadline, DeadlineTask};
use crate::dispatch::ResultDispatchStage;
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::pool::WorkerPool;
use crate::schedule::SinkSet;

/// Submits queries to the collection pool
#[derive(Clone)]
pub struct CollectionStage {
    pool: Arc<WorkerPool>,
    inner: Arc<Collector>,
}

struct Collector {
    source: Arc<dyn MetricSource>,
    clock: Arc<dyn Clock>,
    dispatch: ResultDispatchStage,
    metrics: Arc<PipelineMetrics>,
    rejections: RateLimitedLogger,
}

impl CollectionStage {
    /// Create a stage running queries on `pool`
    pub fn new(
        pool: Arc<WorkerPool>,
        source: Arc<dyn MetricSource>,
        clock: Arc<dyn Clock>,
        dispatch: ResultDispatchStage,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            pool,
            inner: Arc::new(Collector {
                source,
                clock,
                dispatch,
                metrics,
                rejections: RateLimitedLogger::default(),
            }),
        }
    }

    /// Queue `query` for collection, delivering its results to `sinks`
    ///
    /// The query is dropped unrun if it reaches a worker after `deadline`;
    /// its deliveries carry the same deadline.
    ///
    /// # Errors
    ///
    /// `Rejected` or `PoolShutdown` when the collection pool refuses the task.
    pub fn process(&self, deadline: Deadline, query: Arc<Query>, sinks: SinkSet) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        let metrics = Arc::clone(&self.inner.metrics);
        let task = DeadlineTask::new(deadline, Arc::clone(&self.inner.clock), async move {
            inner.collect(deadline, &query, &sinks).await;
        })
        .with_label("collection");

        let submitted = self.pool.submit(async move {
            if !task.run().await {
                metrics.queries_expired.inc();
            }
        });

        match submitted {
            Ok(()) => self.inner.metrics.queries_submitted.inc(),
            Err(_) => self.inner.metrics.queries_rejected.inc(),
        }
        submitted
    }
}

impl Collector {
    async fn collect(&self, deadline: Deadline, query: &Query, sinks: &SinkSet) {
        let outcome = match self
            .source
            .query_attributes(query.pattern(), query.attributes())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.metrics.queries_failed.inc();
                warn!(
                    source = %self.source.name(),
                    query = %query,
                    error = %e,
                    "query failed"
                );
                return;
            }
        };

        for failure in &outcome.failures {
            self.metrics.entity_failures.inc();
            warn!(
                query = %query,
                entity = %failure.entity,
                reason = %failure.reason,
                "entity could not be read"
            );
        }

        debug!(
            query = %query,
            samples = outcome.samples.len(),
            sinks = sinks.len(),
            "query collected"
        );

        for sample in outcome.samples {
            let result = Arc::new(MetricResult::new(
                query.result_name(&sample.entity, &sample.attribute),
                query.kind(),
                sample.value,
                self.clock.now_millis(),
            ));
            self.metrics.results_collected.inc();

            for sink in sinks.iter() {
                if let Err(e) =
                    self.dispatch
                        .write_result(deadline, Arc::clone(&result), Arc::clone(sink))
                {
                    self.rejections.warn("delivery rejected", &e);
                }
            }
        }
    }
}

impl std::fmt::Debug for CollectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStage")
            .field("pool", &self.pool.name())
            .field("source", &self.inner.source.name())
            .finish()
    }
}

#[cfg(test)]
#[path = "collection_test.rs"]
mod collection_test;
