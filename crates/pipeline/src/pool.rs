//! Bounded worker pool
//!
//! A fixed number of named worker tasks pull jobs from one bounded queue.
//! Submission never waits: a full queue rejects the job immediately, which
//! is how overload turns into dropped work instead of unbounded memory.
//!
//! ```text
//! submit() ──try_send──► [bounded mpsc] ──► worker-0 ─┐
//!                                      ├──► worker-1 ─┼─► tokio::spawn(job)
//!                                      └──► worker-N ─┘
//! ```
//!
//! Each job runs in its own task so a panic is contained to that job; the
//! worker logs it and moves on. `shutdown` closes the queue, workers drain
//! what was already queued and exit.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::{AbortHandle, Id, JoinHandle};

use crate::error::{PipelineError, Result};

/// A queued unit of work
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Sizing of a worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker tasks
    pub workers: usize,
    /// Jobs that may wait in the queue
    pub queue_size: usize,
}

impl PoolConfig {
    /// Create a pool configuration
    pub fn new(workers: usize, queue_size: usize) -> Self {
        Self {
            workers,
            queue_size,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(2, 1000)
    }
}

/// Jobs currently executing, so a timed-out shutdown can abort them
type InFlight = Arc<Mutex<HashMap<Id, AbortHandle>>>;

/// Named pool of worker tasks fed by a bounded queue
pub struct WorkerPool {
    name: String,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    in_flight: InFlight,
    terminated: AtomicBool,
}

impl WorkerPool {
    /// Spawn the workers of a new pool on the current runtime
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `workers` or `queue_size` is 0, `Runtime`
    /// when called outside a tokio runtime.
    pub fn new(name: impl Into<String>, config: PoolConfig) -> Result<Self> {
        let name = name.into();
        if config.workers == 0 || config.queue_size == 0 {
            return Err(PipelineError::invalid_argument(format!(
                "pool '{name}' needs at least one worker and one queue slot"
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PipelineError::Runtime(e.to_string()))?;

        let (sender, receiver) = mpsc::channel::<Job>(config.queue_size);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));

        let workers = (0..config.workers)
            .map(|index| {
                let worker = format!("{name}-{index}");
                runtime.spawn(run_worker(
                    worker,
                    Arc::clone(&receiver),
                    Arc::clone(&in_flight),
                ))
            })
            .collect();

        tracing::debug!(
            pool = %name,
            workers = config.workers,
            queue_size = config.queue_size,
            "worker pool started"
        );

        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            in_flight,
            terminated: AtomicBool::new(false),
        })
    }

    /// Pool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job without waiting
    ///
    /// # Errors
    ///
    /// `Rejected` when the queue is full, `PoolShutdown` after `shutdown`.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(PipelineError::pool_shutdown(&self.name));
        };

        match sender.try_send(Box::pin(job)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PipelineError::rejected(&self.name)),
            Err(TrySendError::Closed(_)) => Err(PipelineError::pool_shutdown(&self.name)),
        }
    }

    /// Jobs waiting in the queue
    pub fn queued(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map_or(0, |s| s.max_capacity() - s.capacity())
    }

    /// Stop accepting jobs; queued jobs still run
    pub fn shutdown(&self) {
        if self.sender.lock().take().is_some() {
            tracing::debug!(pool = %self.name, "worker pool shutting down");
        }
    }

    /// Whether `shutdown` was called
    pub fn is_shutdown(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Whether every worker has exited
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
            || (self.is_shutdown() && self.workers.lock().iter().all(JoinHandle::is_finished))
    }

    /// Wait for the workers to drain the queue and exit
    ///
    /// Call after `shutdown`. Returns false when `timeout` elapsed first;
    /// the remaining workers and running jobs are then aborted.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let mut workers = std::mem::take(&mut *self.workers.lock());

        let drained = tokio::time::timeout(timeout, async {
            for worker in workers.iter_mut() {
                let _ = worker.await;
            }
        })
        .await
        .is_ok();

        if !drained {
            for worker in &workers {
                worker.abort();
            }
            let running: Vec<AbortHandle> =
                self.in_flight.lock().drain().map(|(_, handle)| handle).collect();
            tracing::warn!(
                pool = %self.name,
                aborted_jobs = running.len(),
                timeout_ms = timeout.as_millis() as u64,
                "worker pool did not drain in time, abandoning remaining work"
            );
            for job in running {
                job.abort();
            }
        }

        self.terminated.store(true, Ordering::Release);
        drained
    }
}

async fn run_worker(
    worker: String,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    in_flight: InFlight,
) {
    loop {
        // hold the receiver only while waiting, not while running the job
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        let handle = tokio::spawn(job);
        let id = handle.id();
        in_flight.lock().insert(id, handle.abort_handle());
        let outcome = handle.await;
        in_flight.lock().remove(&id);

        if let Err(e) = outcome
            && e.is_panic()
        {
            tracing::error!(worker = %worker, "job panicked");
        }
    }
    tracing::trace!(worker = %worker, "worker stopped");
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("queued", &self.queued())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
