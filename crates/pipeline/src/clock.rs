//! Time sources for the pipeline
//!
//! `SystemClock` and `ManualClock` come from `harvest_protocol`; this
//! module adds `TokioClock`, which follows tokio's (pausable) time.

pub use harvest_protocol::clock::{Clock, ManualClock, SystemClock};
use tokio::time::Instant;

/// Clock anchored at the wall clock and advanced by tokio's monotonic time
///
/// Epoch readings never jump backwards, and under a paused runtime they
/// move exactly as far as `tokio::time::advance` or auto-advance does.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin_millis: i64,
    origin: Instant,
}

impl TokioClock {
    /// Anchor the clock at the current wall-clock time
    pub fn new() -> Self {
        Self::starting_at(SystemClock.now_millis())
    }

    /// Anchor the clock at `origin_millis`
    pub fn starting_at(origin_millis: i64) -> Self {
        Self {
            origin_millis,
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.origin_millis.saturating_add(elapsed)
    }
}
