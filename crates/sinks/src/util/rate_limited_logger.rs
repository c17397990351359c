//! Rate-limited warning logger
//!
//! Overload conditions (saturated pools, a sink failing every write) tend
//! to produce the same warning thousands of times per second. This logger
//! emits at most one warning per interval and reports how many were
//! suppressed in between.
//!
//! # Example
//!
//! ```
//! use harvest_sinks::util::RateLimitedLogger;
//! use std::time::Duration;
//!
//! let logger = RateLimitedLogger::new(Duration::from_secs(1));
//! let err = std::io::Error::other("queue full");
//!
//! assert!(logger.warn("delivery rejected", &err));
//! assert!(!logger.warn("delivery rejected", &err));
//! assert_eq!(logger.suppressed_count(), 1);
//! ```

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between two emitted warnings
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Logger that emits at most one warning per interval
///
/// Thread-safe: counters are atomic and the last emission time sits behind
/// a short mutex.
#[derive(Debug)]
pub struct RateLimitedLogger {
    min_interval: Duration,
    last_log_time: Mutex<Option<Instant>>,
    suppressed: AtomicU64,
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a logger with the given minimum interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_log_time: Mutex::new(None),
            suppressed: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record an occurrence and emit a warning if the interval has passed
    ///
    /// Returns true if the warning was emitted.
    pub fn warn(&self, message: &str, error: &dyn Display) -> bool {
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.should_log() {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let suppressed = self.suppressed.swap(0, Ordering::Relaxed);
        if suppressed > 0 {
            tracing::warn!(
                error = %error,
                suppressed_count = suppressed,
                total,
                "{} (rate-limited)",
                message
            );
        } else {
            tracing::warn!(error = %error, total, "{}", message);
        }
        true
    }

    fn should_log(&self) -> bool {
        let mut last_time = self.last_log_time.lock();
        let now = Instant::now();

        match *last_time {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                *last_time = Some(now);
                true
            }
        }
    }

    /// Occurrences suppressed since the last emitted warning
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// Occurrences recorded since creation
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}
