//! Batch dispatcher
//!
//! Groups results into windows of `batch_size` before handing them to a
//! [`BatchSink`]. A window is flushed when a result arrives and the window
//! is already full, and on close.
//!
//! # Flush protocol
//!
//! ```text
//! write(r) ──► window full? ──no──► push r, return 0
//!                  │
//!                 yes: drain window, push r   (one short lock)
//!                  │
//!                  ▼
//!   before_batch ─► sort by epoch ─► write each ─► after_batch
//! ```
//!
//! Draining and refilling happen under the same lock, so a full window is
//! handed to exactly one flusher and no result is lost or written twice.
//! Flushes are serialized, so the wrapped sink never sees two brackets
//! interleave. `after_batch` runs even when writes inside the window fail;
//! a failed write is logged and the rest of the window is still written.
//! A failed `before_batch` drops the window and is returned to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use harvest_metrics::SinkMetrics;
use harvest_protocol::MetricResult;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::{BatchSink, MetricSink};
use crate::util::BoundedEvictingBuffer;

/// Decorator that writes results to a sink in ordered windows
pub struct BatchDispatcher<S> {
    inner: S,
    window: Mutex<BoundedEvictingBuffer<MetricResult>>,
    flush_lock: tokio::sync::Mutex<()>,
    metrics: Option<Arc<SinkMetrics>>,
}

impl<S: BatchSink> BatchDispatcher<S> {
    /// Wrap `inner` with a window of `batch_size` results
    ///
    /// Fails if `batch_size` is 0.
    pub fn new(inner: S, batch_size: usize) -> Result<Self> {
        Ok(Self {
            inner,
            window: Mutex::new(BoundedEvictingBuffer::new(batch_size)?),
            flush_lock: tokio::sync::Mutex::new(()),
            metrics: None,
        })
    }

    /// Count flushed windows in the wrapped sink's counters
    pub fn with_metrics(mut self, metrics: Arc<SinkMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Wrapped sink
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Results waiting in the current window
    pub fn pending(&self) -> usize {
        self.window.lock().len()
    }

    /// Window size
    pub fn batch_size(&self) -> usize {
        self.window.lock().capacity()
    }

    /// Flush whatever is in the window now
    pub async fn flush(&self) -> Result<usize> {
        let batch = self.window.lock().drain();
        if batch.is_empty() {
            return Ok(0);
        }
        self.flush_batch(batch).await
    }

    async fn flush_batch(&self, mut batch: Vec<MetricResult>) -> Result<usize> {
        let _guard = self.flush_lock.lock().await;

        // stable, so equal timestamps keep arrival order
        batch.sort_by_key(MetricResult::epoch_millis);

        let outcome = self.write_batch(&batch).await;
        let after = self.inner.after_batch().await;

        if let Some(metrics) = &self.metrics {
            metrics.record_batch();
        }
        debug!(
            sink = %self.inner.name(),
            results = batch.len(),
            "batch flushed"
        );

        let written = outcome?;
        after?;
        Ok(written)
    }

    async fn write_batch(&self, batch: &[MetricResult]) -> Result<usize> {
        self.inner.before_batch().await?;

        let mut written = 0;
        for result in batch {
            match self.inner.write(result).await {
                Ok(n) => written += n,
                Err(e) => warn!(
                    sink = %self.inner.name(),
                    metric = %result.name(),
                    error = %e,
                    "failed to write result in batch"
                ),
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl<S: BatchSink> MetricSink for BatchDispatcher<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn sink_type(&self) -> &'static str {
        self.inner.sink_type()
    }

    async fn pre_collect(&self) -> Result<()> {
        self.inner.pre_collect().await
    }

    /// Buffer a result, flushing the previous window if it was full
    ///
    /// Returns the number of results the flush wrote, or 0 when the
    /// result was only buffered.
    async fn write(&self, result: &MetricResult) -> Result<usize> {
        let full = {
            let mut window = self.window.lock();
            let full = if window.is_full() {
                Some(window.drain())
            } else {
                None
            };
            window.add(result.clone());
            full
        };

        match full {
            Some(batch) => self.flush_batch(batch).await,
            None => Ok(0),
        }
    }

    async fn post_collect(&self) -> Result<()> {
        self.inner.post_collect().await
    }

    async fn close(&self) -> Result<()> {
        let flushed = self.flush().await;
        let closed = self.inner.close().await;
        flushed?;
        closed
    }
}

impl<S> std::fmt::Debug for BatchDispatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let window = self.window.lock();
        f.debug_struct("BatchDispatcher")
            .field("batch_size", &window.capacity())
            .field("pending", &window.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
