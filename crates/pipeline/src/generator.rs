//! Query generator
//!
//! Wakes up once per period, stamps the cycle with a deadline of
//! `now + period` and submits every query of the current schedule to the
//! collection stage.
//!
//! The next wake-up is planned from the previous wake time, not from when
//! the cycle's work completes. Slow cycles therefore do not push the period
//! out, and under load consecutive cycles may overlap.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use harvest_protocol::Clock;
use harvest_sinks::util::RateLimitedLogger;
use tracing::{debug, info, warn};

use crate::collection::CollectionStage;
use crate::deadline::Deadline;
use crate::error::Result;
use crate::metrics::PipelineMetrics;
use crate::schedule::Schedule;
use crate::timer::Timer;

/// Periodic producer of collection work
#[derive(Clone)]
pub struct QueryGenerator {
    inner: Arc<GeneratorInner>,
}

struct GeneratorInner {
    running: AtomicBool,
    schedule: ArcSwap<Schedule>,
    collection: CollectionStage,
    timer: Arc<Timer>,
    clock: Arc<dyn Clock>,
    metrics: Arc<PipelineMetrics>,
    rejections: RateLimitedLogger,
}

impl QueryGenerator {
    /// Create a stopped generator
    pub fn new(
        schedule: Schedule,
        collection: CollectionStage,
        timer: Arc<Timer>,
        clock: Arc<dyn Clock>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            inner: Arc::new(GeneratorInner {
                running: AtomicBool::new(false),
                schedule: ArcSwap::from_pointee(schedule),
                collection,
                timer,
                clock,
                metrics,
                rejections: RateLimitedLogger::default(),
            }),
        }
    }

    /// Start generating; the first cycle runs before this returns
    ///
    /// Calling `start` on a running generator does nothing.
    ///
    /// # Errors
    ///
    /// Fails when the next wake-up cannot be scheduled on the timer.
    pub fn start(&self) -> Result<()> {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!(
            period_ms = self.inner.schedule.load().period_millis(),
            queries = self.inner.schedule.load().queries().len(),
            "query generator started"
        );
        let wake = self.inner.clock.now_millis();
        GeneratorInner::run_cycle(&self.inner, wake).inspect_err(|_| {
            self.inner.running.store(false, Ordering::Release);
        })
    }

    /// Stop rescheduling
    ///
    /// Wake-ups already on the timer still fire and run their cycle, but
    /// plan no further one. Work already submitted is not cancelled.
    pub fn stop(&self) {
        if self.inner.running.swap(false, Ordering::AcqRel) {
            info!("query generator stopped");
        }
    }

    /// Whether the generator reschedules itself
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Replace the schedule used by the following cycles
    pub fn reconfigure(&self, schedule: Schedule) {
        debug!(
            period_ms = schedule.period_millis(),
            queries = schedule.queries().len(),
            sinks = schedule.sinks().len(),
            "schedule replaced"
        );
        self.inner.schedule.store(Arc::new(schedule));
    }

    /// Schedule the next cycle will run
    pub fn schedule(&self) -> Arc<Schedule> {
        self.inner.schedule.load_full()
    }
}

impl GeneratorInner {
    fn run_cycle(this: &Arc<Self>, wake: i64) -> Result<()> {
        this.metrics.cycles.inc();

        // one snapshot per cycle
        let schedule = this.schedule.load_full();
        let deadline = Deadline::after(this.clock.as_ref(), schedule.period())?;

        let mut submitted = 0usize;
        for query in schedule.queries() {
            match this
                .collection
                .process(deadline, Arc::clone(query), Arc::clone(schedule.sinks()))
            {
                Ok(()) => submitted += 1,
                Err(e) => {
                    this.rejections.warn("query submission rejected", &e);
                }
            }
        }

        debug!(
            wake,
            deadline = %deadline,
            submitted,
            queries = schedule.queries().len(),
            "collection cycle submitted"
        );

        if !this.running.load(Ordering::Acquire) {
            return Ok(());
        }

        let next = wake.saturating_add(schedule.period_millis());
        let delay = next.saturating_sub(this.clock.now_millis()).max(0);
        let weak: Weak<Self> = Arc::downgrade(this);
        this.timer
            .schedule(Duration::from_millis(delay as u64), move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if let Err(e) = GeneratorInner::run_cycle(&inner, next) {
                    warn!(error = %e, "collection cycle could not be rescheduled");
                }
            })
    }
}

impl std::fmt::Debug for QueryGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryGenerator")
            .field("running", &self.is_running())
            .field("schedule", &self.schedule())
            .finish()
    }
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod generator_test;
