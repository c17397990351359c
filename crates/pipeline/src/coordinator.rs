//! Pipeline coordinator
//!
//! Owns the lifecycle of one pipeline: the two worker pools, the timer, both
//! stages and the query generator.
//!
//! ```text
//! New ──start──► Starting ──► Running ──stop──► Stopping ──► Terminated
//!                   │                              │
//!                   └──────────► Failed ◄──────────┘
//! ```
//!
//! `stop` drains in dependency order: the timer first so no new cycle
//! starts, then the collection pool so no new delivery is submitted, then
//! the delivery pool. Sinks are closed last, concurrently, which flushes any
//! pending batch window. The drain and the closes share one
//! `shutdown_timeout`; work still outstanding when it runs out is abandoned.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use harvest_config::GlobalConfig;
use harvest_protocol::Clock;
use harvest_sinks::MetricSink;
use harvest_sources::MetricSource;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::collection::CollectionStage;
use crate::dispatch::ResultDispatchStage;
use crate::error::{PipelineError, Result};
use crate::generator::QueryGenerator;
use crate::metrics::{PipelineMetrics, PipelineMetricsHandle};
use crate::pool::{PoolConfig, WorkerPool};
use crate::schedule::Schedule;
use crate::timer::Timer;

/// Lifecycle state of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    New,
    Starting,
    Running,
    Stopping,
    Terminated,
    Failed,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Sizing of the pipeline's pools and shutdown bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Pool running queries against the source
    pub collection: PoolConfig,
    /// Pool delivering results to sinks
    pub delivery: PoolConfig,
    /// Upper bound on the whole of `stop`
    pub shutdown_timeout: Duration,
}

impl PipelineConfig {
    /// Take pool sizes and the shutdown bound from the global config
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            collection: PoolConfig::new(global.collection_workers, global.collection_queue),
            delivery: PoolConfig::new(global.delivery_workers, global.delivery_queue),
            shutdown_timeout: global.shutdown_timeout,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_global(&GlobalConfig::default())
    }
}

/// Everything `start` creates and `stop` tears down
#[derive(Clone)]
struct Components {
    timer: Arc<Timer>,
    collection: Arc<WorkerPool>,
    delivery: Arc<WorkerPool>,
    generator: QueryGenerator,
}

/// Lifecycle owner of one collection pipeline
pub struct Coordinator {
    config: PipelineConfig,
    source: Arc<dyn MetricSource>,
    clock: Arc<dyn Clock>,
    metrics: Arc<PipelineMetrics>,
    state: Mutex<CoordinatorState>,
    /// Schedule applied on start; superseded by the generator's once running
    schedule: Mutex<Schedule>,
    /// Every sink any schedule has used, closed on stop
    sinks: Mutex<Vec<Arc<dyn MetricSink>>>,
    /// Kept after stop so shutdown stays observable
    components: Mutex<Option<Components>>,
}

impl Coordinator {
    /// Create a coordinator in the `New` state
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn MetricSource>,
        schedule: Schedule,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut sinks = Vec::new();
        track_sinks(&mut sinks, &schedule);
        Self {
            config,
            source,
            clock,
            metrics: Arc::new(PipelineMetrics::new()),
            state: Mutex::new(CoordinatorState::New),
            schedule: Mutex::new(schedule),
            sinks: Mutex::new(sinks),
            components: Mutex::new(None),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    /// Get a metrics handle for reporting
    ///
    /// The handle stays valid after the coordinator has stopped.
    pub fn metrics_handle(&self) -> PipelineMetricsHandle {
        PipelineMetricsHandle::new(Arc::clone(&self.metrics))
    }

    /// Whether the pools and the timer have stopped accepting work
    ///
    /// False until the coordinator has been started and stopped.
    pub fn is_shut_down(&self) -> bool {
        self.components.lock().as_ref().is_some_and(|c| {
            c.timer.is_shutdown() && c.collection.is_shutdown() && c.delivery.is_shutdown()
        })
    }

    /// Whether the timer task and every pool worker have exited
    pub fn is_drained(&self) -> bool {
        self.components.lock().as_ref().is_some_and(|c| {
            c.timer.is_terminated() && c.collection.is_terminated() && c.delivery.is_terminated()
        })
    }

    /// Start the pipeline; the first cycle is submitted before this returns
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the coordinator is `New`. Any failure while
    /// starting leaves it `Failed` and is returned.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != CoordinatorState::New {
            return Err(PipelineError::invalid_state("start", *state));
        }
        *state = CoordinatorState::Starting;

        match self.launch() {
            Ok(components) => {
                *self.components.lock() = Some(components);
                *state = CoordinatorState::Running;
                info!(
                    collection_workers = self.config.collection.workers,
                    delivery_workers = self.config.delivery.workers,
                    "pipeline running"
                );
                Ok(())
            }
            Err(e) => {
                *state = CoordinatorState::Failed;
                error!(error = %e, "pipeline failed to start");
                Err(e)
            }
        }
    }

    fn launch(&self) -> Result<Components> {
        let collection = Arc::new(WorkerPool::new("collection", self.config.collection)?);
        let delivery = match WorkerPool::new("delivery", self.config.delivery) {
            Ok(pool) => Arc::new(pool),
            Err(e) => {
                collection.shutdown();
                return Err(e);
            }
        };
        let timer = match Timer::new("generator") {
            Ok(timer) => Arc::new(timer),
            Err(e) => {
                collection.shutdown();
                delivery.shutdown();
                return Err(e);
            }
        };

        let dispatch = ResultDispatchStage::new(
            Arc::clone(&delivery),
            Arc::clone(&self.clock),
            Arc::clone(&self.metrics),
        );
        let stage = CollectionStage::new(
            Arc::clone(&collection),
            Arc::clone(&self.source),
            Arc::clone(&self.clock),
            dispatch,
            Arc::clone(&self.metrics),
        );
        let generator = QueryGenerator::new(
            self.schedule.lock().clone(),
            stage,
            Arc::clone(&timer),
            Arc::clone(&self.clock),
            Arc::clone(&self.metrics),
        );

        if let Err(e) = generator.start() {
            timer.shutdown();
            collection.shutdown();
            delivery.shutdown();
            return Err(e);
        }

        Ok(Components {
            timer,
            collection,
            delivery,
            generator,
        })
    }

    /// Stop the pipeline and close every sink
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the coordinator is `Starting` or `Running`.
    /// A sink that fails to close leaves the coordinator `Failed`; the
    /// other sinks are still closed and the first error is returned. A
    /// close still running at the shutdown deadline is abandoned.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !matches!(
                *state,
                CoordinatorState::Starting | CoordinatorState::Running
            ) {
                return Err(PipelineError::invalid_state("stop", *state));
            }
            *state = CoordinatorState::Stopping;
        }
        info!("pipeline stopping");

        let deadline = Instant::now() + self.config.shutdown_timeout;
        let components = self.components.lock().clone();
        if let Some(components) = components {
            self.drain(&components, deadline).await;
        }

        let closed = self.close_sinks(deadline).await;

        let mut state = self.state.lock();
        match closed {
            Ok(()) => {
                *state = CoordinatorState::Terminated;
                info!("pipeline stopped");
                Ok(())
            }
            Err(e) => {
                *state = CoordinatorState::Failed;
                Err(e)
            }
        }
    }

    async fn drain(&self, components: &Components, deadline: Instant) {
        let remaining = || deadline.saturating_duration_since(Instant::now());

        components.generator.stop();

        components.timer.shutdown();
        let timer_done = components.timer.await_termination(remaining()).await;

        components.collection.shutdown();
        let collection_done = components.collection.await_termination(remaining()).await;

        components.delivery.shutdown();
        let delivery_done = components.delivery.await_termination(remaining()).await;

        if !(timer_done && collection_done && delivery_done) {
            warn!(
                timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                timer_done,
                collection_done,
                delivery_done,
                "shutdown timeout reached, outstanding work abandoned"
            );
        }
    }

    async fn close_sinks(&self, deadline: Instant) -> Result<()> {
        let sinks = std::mem::take(&mut *self.sinks.lock());
        let mut closing = JoinSet::new();
        for sink in sinks {
            closing.spawn(async move {
                let closed = sink.close().await;
                (sink, closed)
            });
        }

        let mut first_error = None;
        loop {
            match tokio::time::timeout_at(deadline, closing.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok((_, Ok(()))))) => {}
                Ok(Some(Ok((sink, Err(e))))) => {
                    error!(sink = %sink.name(), error = %e, "sink failed to close");
                    first_error.get_or_insert(e);
                }
                Ok(Some(Err(e))) => error!(error = %e, "sink close panicked"),
                Err(_) => {
                    warn!(
                        timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                        pending = closing.len(),
                        "shutdown timeout reached, abandoning sinks still closing"
                    );
                    closing.abort_all();
                    break;
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Replace the schedule
    ///
    /// Before `start` this changes the schedule the pipeline starts with;
    /// while running it takes effect from the next cycle. Sinks the new
    /// schedule drops stay open until `stop`, since deliveries already
    /// queued may still reach them.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the coordinator is `New` or `Running`.
    pub fn reconfigure(&self, schedule: Schedule) -> Result<()> {
        let state = self.state.lock();
        match *state {
            CoordinatorState::New | CoordinatorState::Running => {}
            other => return Err(PipelineError::invalid_state("reconfigure", other)),
        }

        track_sinks(&mut self.sinks.lock(), &schedule);

        if let Some(components) = self.components.lock().as_ref() {
            components.generator.reconfigure(schedule.clone());
        }
        *self.schedule.lock() = schedule;
        Ok(())
    }

    /// Schedule currently in effect
    pub fn schedule(&self) -> Schedule {
        self.schedule.lock().clone()
    }
}

/// Remember the schedule's sinks, each `Arc` once
fn track_sinks(known: &mut Vec<Arc<dyn MetricSink>>, schedule: &Schedule) {
    for sink in schedule.sinks().iter() {
        if !known.iter().any(|k| Arc::ptr_eq(k, sink)) {
            known.push(Arc::clone(sink));
        }
    }
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("source", &self.source.name())
            .finish()
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;
