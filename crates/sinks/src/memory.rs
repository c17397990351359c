//! In-memory sink
//!
//! Records every call it receives, in order. Used by tests and benches to
//! observe what the decorators and the pipeline do, and can be told to
//! fail so error paths can be driven on demand.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use harvest_metrics::SinkMetrics;
use harvest_protocol::MetricResult;
use parking_lot::Mutex;

use crate::error::{Result, SinkError};
use crate::metrics::SinkMetricsHandle;
use crate::traits::{BatchSink, MetricSink};

/// One observed call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    PreCollect,
    Write(MetricResult),
    PostCollect,
    BeforeBatch,
    AfterBatch,
    Close,
}

/// Sink that keeps everything it is given
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    events: Mutex<Vec<SinkEvent>>,
    fail_writes: AtomicBool,
    fail_hooks: AtomicBool,
    metrics: Arc<SinkMetrics>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            fail_hooks: AtomicBool::new(false),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Make `write` fail (the call is still recorded)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Make the collect and batch hooks fail
    pub fn set_fail_hooks(&self, fail: bool) {
        self.fail_hooks.store(fail, Ordering::Relaxed);
    }

    /// All recorded calls
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// Results that were written, in order
    pub fn results(&self) -> Vec<MetricResult> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Write(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls matching `event`
    pub fn count(&self, event: &SinkEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Counters of this sink
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle for the metrics reporter
    pub fn metrics_handle(&self) -> SinkMetricsHandle {
        SinkMetricsHandle::new(&self.name, "memory", self.metrics())
    }

    fn hook(&self, event: SinkEvent) -> Result<()> {
        self.events.lock().push(event);
        if self.fail_hooks.load(Ordering::Relaxed) {
            self.metrics.record_error();
            return Err(SinkError::write(format!("{}: hook failed", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &'static str {
        "memory"
    }

    async fn pre_collect(&self) -> Result<()> {
        self.hook(SinkEvent::PreCollect)
    }

    async fn write(&self, result: &MetricResult) -> Result<usize> {
        self.events.lock().push(SinkEvent::Write(result.clone()));
        if self.fail_writes.load(Ordering::Relaxed) {
            self.metrics.record_error();
            return Err(SinkError::write(format!(
                "{}: rejected {}",
                self.name,
                result.name()
            )));
        }
        self.metrics.record_written(1);
        Ok(1)
    }

    async fn post_collect(&self) -> Result<()> {
        self.hook(SinkEvent::PostCollect)
    }

    async fn close(&self) -> Result<()> {
        self.events.lock().push(SinkEvent::Close);
        Ok(())
    }
}

#[async_trait]
impl BatchSink for MemorySink {
    async fn before_batch(&self) -> Result<()> {
        self.hook(SinkEvent::BeforeBatch)
    }

    async fn after_batch(&self) -> Result<()> {
        self.hook(SinkEvent::AfterBatch)
    }
}
