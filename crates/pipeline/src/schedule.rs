//! Collection schedule
//!
//! What the generator runs every cycle: the period, the queries and the
//! sinks every result goes to. A schedule is immutable; reconfiguring swaps
//! in a new one as a whole, so a cycle never sees a mix of old and new.

use std::sync::Arc;
use std::time::Duration;

use harvest_protocol::Query;
use harvest_sinks::MetricSink;

use crate::error::{PipelineError, Result};

/// Sinks shared by every task of a cycle
pub type SinkSet = Arc<[Arc<dyn MetricSink>]>;

/// Immutable snapshot of what to collect and where to deliver it
#[derive(Clone)]
pub struct Schedule {
    period: Duration,
    queries: Vec<Arc<Query>>,
    sinks: SinkSet,
}

impl Schedule {
    /// Create a schedule
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `period` is shorter than one millisecond.
    pub fn new(
        period: Duration,
        queries: impl IntoIterator<Item = Query>,
        sinks: impl IntoIterator<Item = Arc<dyn MetricSink>>,
    ) -> Result<Self> {
        if period.as_millis() == 0 {
            return Err(PipelineError::invalid_argument(
                "collection period must be at least 1ms",
            ));
        }
        Ok(Self {
            period,
            queries: queries.into_iter().map(Arc::new).collect(),
            sinks: sinks.into_iter().collect(),
        })
    }

    /// Interval between cycles
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Interval between cycles in milliseconds
    pub fn period_millis(&self) -> i64 {
        i64::try_from(self.period.as_millis()).unwrap_or(i64::MAX)
    }

    /// Queries run every cycle
    pub fn queries(&self) -> &[Arc<Query>] {
        &self.queries
    }

    /// Sinks receiving every result
    pub fn sinks(&self) -> &SinkSet {
        &self.sinks
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sinks: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("Schedule")
            .field("period", &self.period)
            .field("queries", &self.queries.len())
            .field("sinks", &sinks)
            .finish()
    }
}
