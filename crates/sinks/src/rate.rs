//! Rate sink - per-second derivative of every metric
//!
//! Keeps the last `window` numeric values of each metric name and, once it
//! has two of them, forwards `<name>.rate` to an output sink. The rate is
//! taken across the whole window (oldest to newest), which smooths jitter
//! in the collection period.
//!
//! A counter whose value goes down was reset; its window restarts from the
//! new value. Non-numeric values and samples older than the newest one
//! kept are ignored.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use harvest_metrics::SinkMetrics;
use harvest_protocol::{MetricKind, MetricResult};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, SinkError};
use crate::metrics::SinkMetricsHandle;
use crate::traits::{BatchSink, MetricSink};
use crate::util::BoundedEvictingBuffer;

/// Sink type name
pub const SINK_TYPE: &str = "rate";

/// Smallest usable window
pub const MIN_WINDOW: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Sample {
    epoch_millis: i64,
    value: f64,
}

/// Sink deriving rates and forwarding them to another sink
pub struct RateSink {
    name: String,
    window: usize,
    output: Arc<dyn MetricSink>,
    series: Mutex<HashMap<String, BoundedEvictingBuffer<Sample>>>,
    metrics: Arc<SinkMetrics>,
}

impl RateSink {
    /// Create a rate sink keeping `window` values per metric
    pub fn new(name: impl Into<String>, window: usize, output: Arc<dyn MetricSink>) -> Result<Self> {
        if window < MIN_WINDOW {
            return Err(SinkError::config(format!(
                "rate window must be at least {MIN_WINDOW}, got {window}"
            )));
        }
        Ok(Self {
            name: name.into(),
            window,
            output,
            series: Mutex::new(HashMap::new()),
            metrics: Arc::new(SinkMetrics::new()),
        })
    }

    /// Counters of this sink
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Handle for the metrics reporter
    pub fn metrics_handle(&self) -> SinkMetricsHandle {
        SinkMetricsHandle::new(&self.name, SINK_TYPE, self.metrics())
    }

    /// Number of metric names being tracked
    pub fn tracked(&self) -> usize {
        self.series.lock().len()
    }

    /// Record a result and compute the rate it completes, if any
    fn observe(&self, result: &MetricResult) -> Result<Option<MetricResult>> {
        let Some(value) = result.value().as_f64() else {
            debug!(sink = %self.name, metric = %result.name(), "non-numeric value ignored");
            return Ok(None);
        };
        let sample = Sample {
            epoch_millis: result.epoch_millis(),
            value,
        };

        let mut series = self.series.lock();
        let window = match series.entry(result.name().to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(BoundedEvictingBuffer::new(self.window)?),
        };

        if let Some(newest) = window.peek_newest().copied() {
            if sample.epoch_millis < newest.epoch_millis {
                debug!(sink = %self.name, metric = %result.name(), "out-of-order sample ignored");
                return Ok(None);
            }
            if result.kind() == MetricKind::Counter && sample.value < newest.value {
                debug!(sink = %self.name, metric = %result.name(), "counter reset, window restarted");
                window.clear();
            }
        }
        window.add(sample);

        let (Some(oldest), Some(newest)) = (window.peek(), window.peek_newest()) else {
            return Ok(None);
        };
        let elapsed_secs = (newest.epoch_millis - oldest.epoch_millis) as f64 / 1000.0;
        if elapsed_secs <= 0.0 {
            return Ok(None);
        }

        let rate = (newest.value - oldest.value) / elapsed_secs;
        Ok(Some(MetricResult::new(
            format!("{}.rate", result.name()),
            MetricKind::Gauge,
            rate,
            newest.epoch_millis,
        )))
    }
}

#[async_trait]
impl MetricSink for RateSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &'static str {
        SINK_TYPE
    }

    async fn pre_collect(&self) -> Result<()> {
        self.output.pre_collect().await
    }

    async fn write(&self, result: &MetricResult) -> Result<usize> {
        let Some(rate) = self.observe(result)? else {
            return Ok(0);
        };

        match self.output.write(&rate).await {
            Ok(n) => {
                self.metrics.record_written(n as u64);
                Ok(n)
            }
            Err(e) => {
                self.metrics.record_error();
                Err(e)
            }
        }
    }

    async fn post_collect(&self) -> Result<()> {
        self.output.post_collect().await
    }

    async fn close(&self) -> Result<()> {
        self.output.close().await
    }
}

impl BatchSink for RateSink {}

impl std::fmt::Debug for RateSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateSink")
            .field("name", &self.name)
            .field("window", &self.window)
            .field("output", &self.output.name())
            .finish()
    }
}

#[cfg(test)]
#[path = "rate_test.rs"]
mod rate_test;
