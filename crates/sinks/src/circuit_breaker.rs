//! Circuit breaker decorator
//!
//! Wraps a sink and stops calling it after a run of consecutive failures.
//! While the circuit is open every call is skipped and reported as a
//! success, so a broken destination cannot back up the delivery stage.
//! After the cool-down the next call goes through again.
//!
//! Failed writes and failed hooks both count towards the threshold, but only
//! a successful write resets the count. The pipeline calls the hooks around
//! every delivery, so a sink that accepts hooks and rejects every result
//! still trips.
//!
//! The failure that trips the breaker is still returned to the caller.
//!
//! ```text
//!   closed ──(max_failures consecutive errors)──► open
//!     ▲                                            │
//!     └──────────(disable_duration elapsed)────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use harvest_config::CircuitBreakerConfig;
use harvest_metrics::SinkMetrics;
use harvest_protocol::{Clock, MetricResult};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::{BatchSink, MetricSink};

/// Consecutive failures before the circuit opens
pub const MAX_FAILURES: u32 = 5;

/// How long an open circuit stays open
pub const DISABLE_DURATION: Duration = Duration::from_secs(60);

/// Sentinel for "no cool-down in progress"
const NOT_DISABLED: i64 = 0;

/// Sink decorator that disables a failing sink for a while
pub struct CircuitBreaker<S> {
    inner: S,
    clock: Arc<dyn Clock>,

    /// Configured on/off switch for the whole sink
    enabled: AtomicBool,

    /// When false, failures are passed through without ever tripping
    trip_on_failure: bool,
    max_failures: u32,
    disable_millis: i64,

    consecutive_failures: AtomicU32,
    disabled_until: AtomicI64,

    metrics: Option<Arc<SinkMetrics>>,
}

impl<S: MetricSink> CircuitBreaker<S> {
    /// Wrap a sink with the default thresholds
    pub fn new(inner: S, clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(inner, clock, MAX_FAILURES, DISABLE_DURATION)
    }

    /// Wrap a sink with explicit thresholds
    pub fn with_limits(
        inner: S,
        clock: Arc<dyn Clock>,
        max_failures: u32,
        disable_duration: Duration,
    ) -> Self {
        Self {
            inner,
            clock,
            enabled: AtomicBool::new(true),
            trip_on_failure: true,
            max_failures: max_failures.max(1),
            disable_millis: i64::try_from(disable_duration.as_millis()).unwrap_or(i64::MAX),
            consecutive_failures: AtomicU32::new(0),
            disabled_until: AtomicI64::new(NOT_DISABLED),
            metrics: None,
        }
    }

    /// Wrap a sink using its `[sinks.<name>.circuit_breaker]` section
    pub fn from_config(inner: S, config: &CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let mut breaker =
            Self::with_limits(inner, clock, config.max_failures, config.disable_duration);
        breaker.trip_on_failure = config.enabled;
        breaker
    }

    /// Share the wrapped sink's counters so skipped calls are visible
    pub fn with_metrics(mut self, metrics: Arc<SinkMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Builder form of [`set_enabled`](Self::set_enabled)
    pub fn with_enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    /// Turn the sink on or off regardless of its failure history
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Wrapped sink
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Failures recorded since the last successful write or trip
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Whether calls are currently being skipped
    ///
    /// An expired cool-down is cleared here, so the first call after it
    /// reaches the wrapped sink.
    pub fn is_disabled(&self) -> bool {
        if !self.enabled.load(Ordering::Relaxed) {
            return true;
        }

        let until = self.disabled_until.load(Ordering::Acquire);
        if until == NOT_DISABLED {
            return false;
        }
        if self.clock.now_millis() < until {
            return true;
        }

        if self
            .disabled_until
            .compare_exchange(until, NOT_DISABLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!(sink = %self.inner.name(), "sink re-enabled after cool-down");
        }
        false
    }

    fn skip(&self, operation: &'static str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_skipped();
        }
        debug!(sink = %self.inner.name(), operation, "sink disabled, call skipped");
    }

    fn record_write(&self, result: Result<usize>) -> Result<usize> {
        if result.is_ok() {
            self.consecutive_failures.store(0, Ordering::Relaxed);
        }
        self.record_hook(result)
    }

    /// Count a failed call without letting a successful one reset the run
    fn record_hook<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result
            && self.trip_on_failure
        {
            self.record_failure(e);
        }
        result
    }

    fn record_failure(&self, error: &dyn std::fmt::Display) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures < self.max_failures {
            return;
        }

        let until = self
            .clock
            .now_millis()
            .saturating_add(self.disable_millis)
            .max(NOT_DISABLED + 1);
        self.disabled_until.store(until, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Relaxed);

        warn!(
            sink = %self.inner.name(),
            failures,
            disable_secs = self.disable_millis / 1000,
            error = %error,
            "sink disabled after consecutive failures"
        );
    }
}

#[async_trait]
impl<S: MetricSink> MetricSink for CircuitBreaker<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn sink_type(&self) -> &'static str {
        self.inner.sink_type()
    }

    async fn pre_collect(&self) -> Result<()> {
        if self.is_disabled() {
            self.skip("pre_collect");
            return Ok(());
        }
        self.record_hook(self.inner.pre_collect().await)
    }

    async fn write(&self, result: &MetricResult) -> Result<usize> {
        if self.is_disabled() {
            self.skip("write");
            return Ok(0);
        }
        self.record_write(self.inner.write(result).await)
    }

    async fn post_collect(&self) -> Result<()> {
        if self.is_disabled() {
            self.skip("post_collect");
            return Ok(());
        }
        self.record_hook(self.inner.post_collect().await)
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

#[async_trait]
impl<S: BatchSink> BatchSink for CircuitBreaker<S> {
    async fn before_batch(&self) -> Result<()> {
        if self.is_disabled() {
            self.skip("before_batch");
            return Ok(());
        }
        self.record_hook(self.inner.before_batch().await)
    }

    async fn after_batch(&self) -> Result<()> {
        if self.is_disabled() {
            self.skip("after_batch");
            return Ok(());
        }
        self.record_hook(self.inner.after_batch().await)
    }
}

impl<S> std::fmt::Debug for CircuitBreaker<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("enabled", &self.enabled.load(Ordering::Relaxed))
            .field("max_failures", &self.max_failures)
            .field("disable_millis", &self.disable_millis)
            .field("consecutive_failures", &self.consecutive_failures.load(Ordering::Relaxed))
            .field("disabled_until", &self.disabled_until.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
#[path = "circuit_breaker_test.rs"]
mod circuit_breaker_test;
