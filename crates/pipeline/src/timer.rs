//! Single-task timer
//!
//! Runs short callbacks after a delay on one dedicated task, backed by a
//! `DelayQueue`. Callbacks must not block: the generator only uses it to
//! kick off the next cycle, which submits work and returns.
//!
//! Shutting down discards every pending callback.

use std::future::poll_fn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;

use crate::error::{PipelineError, Result};

/// Callback run by the timer task
pub type TimerJob = Box<dyn FnOnce() + Send + 'static>;

/// Delayed callback runner on a single task
pub struct Timer {
    name: String,
    sender: Mutex<Option<mpsc::UnboundedSender<(Duration, TimerJob)>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    terminated: AtomicBool,
}

impl Timer {
    /// Spawn the timer task on the current runtime
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PipelineError::Runtime(e.to_string()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_timer(name.clone(), receiver));

        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            task: Mutex::new(Some(task)),
            terminated: AtomicBool::new(false),
        })
    }

    /// Run `job` on the timer task after `delay`
    ///
    /// # Errors
    ///
    /// `PoolShutdown` once the timer has been shut down.
    pub fn schedule<F>(&self, delay: Duration, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(PipelineError::pool_shutdown(&self.name));
        };
        sender
            .send((delay, Box::new(job)))
            .map_err(|_| PipelineError::pool_shutdown(&self.name))
    }

    /// Stop the timer; pending callbacks never run
    pub fn shutdown(&self) {
        if self.sender.lock().take().is_some() {
            tracing::debug!(timer = %self.name, "timer shutting down");
        }
    }

    /// Whether `shutdown` was called
    pub fn is_shutdown(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Whether the timer task has exited
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
            || self.task.lock().as_ref().is_some_and(JoinHandle::is_finished)
    }

    /// Wait for the timer task to exit, aborting it after `timeout`
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let Some(mut task) = self.task.lock().take() else {
            return true;
        };

        let finished = tokio::time::timeout(timeout, &mut task).await.is_ok();
        if !finished {
            tracing::warn!(timer = %self.name, "timer did not stop in time, aborting");
            task.abort();
        }
        self.terminated.store(true, Ordering::Release);
        finished
    }
}

async fn run_timer(name: String, mut receiver: mpsc::UnboundedReceiver<(Duration, TimerJob)>) {
    let mut queue: DelayQueue<TimerJob> = DelayQueue::new();

    loop {
        // a closed channel wins over due callbacks, so nothing runs after shutdown
        tokio::select! {
            biased;
            scheduled = receiver.recv() => match scheduled {
                Some((delay, job)) => {
                    queue.insert(job, delay);
                }
                None => break,
            },
            Some(expired) = poll_fn(|cx| queue.poll_expired(cx)), if !queue.is_empty() => {
                (expired.into_inner())();
            }
        }
    }

    tracing::debug!(timer = %name, discarded = queue.len(), "timer stopped");
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
