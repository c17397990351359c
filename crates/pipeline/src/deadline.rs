//! Deadline admission control
//!
//! Every task of a collection cycle carries the cycle's deadline. A task
//! that reaches a worker after its deadline is dropped without running, so
//! a backlog from a slow cycle never delays the next one. The check happens
//! once, when the task starts; a task that is already running is never
//! interrupted.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use harvest_protocol::Clock;

use crate::error::{PipelineError, Result};

/// Absolute point in time (epoch milliseconds) after which work is stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(i64);

impl Deadline {
    /// Create a deadline at `epoch_millis`
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidArgument` for negative values.
    pub fn new(epoch_millis: i64) -> Result<Self> {
        if epoch_millis < 0 {
            return Err(PipelineError::invalid_argument(format!(
                "deadline must not be negative, got {epoch_millis}"
            )));
        }
        Ok(Self(epoch_millis))
    }

    /// Deadline `period` after the clock's current time
    pub fn after(clock: &dyn Clock, period: Duration) -> Result<Self> {
        let period = i64::try_from(period.as_millis()).unwrap_or(i64::MAX);
        Self::new(clock.now_millis().saturating_add(period))
    }

    /// Deadline as epoch milliseconds
    #[inline]
    pub fn epoch_millis(&self) -> i64 {
        self.0
    }

    /// Whether `now_millis` is past the deadline
    #[inline]
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis > self.0
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A unit of work that only runs if its deadline has not passed
pub struct DeadlineTask<F> {
    deadline: Deadline,
    clock: Arc<dyn Clock>,
    label: &'static str,
    payload: F,
}

impl<F: Future<Output = ()>> DeadlineTask<F> {
    /// Wrap `payload` with `deadline`
    pub fn new(deadline: Deadline, clock: Arc<dyn Clock>, payload: F) -> Self {
        Self {
            deadline,
            clock,
            label: "task",
            payload,
        }
    }

    /// Name the task in the expiry log line
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Deadline of this task
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Run the payload unless the deadline has passed
    ///
    /// Returns false when the task expired; the payload is then dropped
    /// without ever being polled.
    pub async fn run(self) -> bool {
        let now = self.clock.now_millis();
        if self.deadline.is_expired(now) {
            tracing::debug!(
                task = self.label,
                deadline = self.deadline.epoch_millis(),
                late_ms = now - self.deadline.epoch_millis(),
                "deadline passed, task dropped"
            );
            return false;
        }

        self.payload.await;
        true
    }
}

impl<F> fmt::Debug for DeadlineTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineTask")
            .field("deadline", &self.deadline)
            .field("label", &self.label)
            .finish()
    }
}

#[cfg(test)]
#[path = "deadline_test.rs"]
mod deadline_test;
