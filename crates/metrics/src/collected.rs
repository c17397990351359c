//! Collected metrics snapshot and rate calculations
//!
//! Holds every component's metrics at a point in time, plus the per-second
//! rates between two consecutive collections.

use crate::SinkMetricsSnapshot;
use std::time::{Duration, Instant};

/// Pipeline counters snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineSnapshot {
    /// Generator wake-ups
    pub cycles: u64,
    /// Queries accepted by the collection pool
    pub queries_submitted: u64,
    /// Queries rejected by a saturated or stopped collection pool
    pub queries_rejected: u64,
    /// Queries dropped because their cycle deadline had passed
    pub queries_expired: u64,
    /// Queries the source failed to answer
    pub queries_failed: u64,
    /// Matched entities that could not be read
    pub entity_failures: u64,
    /// Results produced by collection
    pub results_collected: u64,
    /// Deliveries accepted by the delivery pool
    pub deliveries_submitted: u64,
    /// Deliveries rejected by a saturated or stopped delivery pool
    pub deliveries_rejected: u64,
    /// Deliveries dropped because their cycle deadline had passed
    pub deliveries_expired: u64,
    /// Deliveries the sink accepted
    pub deliveries_succeeded: u64,
    /// Deliveries the sink failed
    pub deliveries_failed: u64,
}

impl PipelineSnapshot {
    /// Total dropped work (rejected or expired, at either stage)
    pub fn dropped(&self) -> u64 {
        self.queries_rejected
            + self.queries_expired
            + self.deliveries_rejected
            + self.deliveries_expired
    }
}

/// Collected sink snapshot with metadata
#[derive(Debug, Clone)]
pub struct CollectedSink {
    /// Configured sink name
    pub name: String,
    /// Sink type (stdout, null, rate)
    pub sink_type: String,
    /// Metrics snapshot
    pub snapshot: SinkMetricsSnapshot,
}

/// Complete metrics collection at a point in time
#[derive(Debug, Clone, Default)]
pub struct CollectedMetrics {
    /// When this collection was taken
    pub timestamp: Option<Instant>,

    /// Pipeline counters
    pub pipeline: Option<PipelineSnapshot>,

    /// All sink metrics
    pub sinks: Vec<CollectedSink>,
}

impl CollectedMetrics {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self {
            timestamp: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Calculate rates by comparing with a previous snapshot
    ///
    /// Returns None if timestamps are missing or identical.
    pub fn rates(&self, previous: &CollectedMetrics) -> Option<MetricsRates> {
        let current_ts = self.timestamp?;
        let previous_ts = previous.timestamp?;

        let elapsed = current_ts.duration_since(previous_ts);
        if elapsed.is_zero() {
            return None;
        }

        let elapsed_secs = elapsed.as_secs_f64();

        let pipeline = match (&self.pipeline, &previous.pipeline) {
            (Some(current), Some(prev)) => Some(PipelineRates {
                results_per_sec: rate(
                    current.results_collected,
                    prev.results_collected,
                    elapsed_secs,
                ),
                deliveries_per_sec: rate(
                    current.deliveries_succeeded,
                    prev.deliveries_succeeded,
                    elapsed_secs,
                ),
                dropped: current.dropped().saturating_sub(prev.dropped()),
            }),
            _ => None,
        };

        // Sinks are matched by name
        let sinks = self
            .sinks
            .iter()
            .filter_map(|current| {
                let prev = previous.sinks.iter().find(|s| s.name == current.name)?;
                Some(SinkRates {
                    name: current.name.clone(),
                    sink_type: current.sink_type.clone(),
                    results_per_sec: rate(
                        current.snapshot.results_written,
                        prev.snapshot.results_written,
                        elapsed_secs,
                    ),
                    errors: current
                        .snapshot
                        .write_errors
                        .saturating_sub(prev.snapshot.write_errors),
                    skipped: current.snapshot.skipped.saturating_sub(prev.snapshot.skipped),
                })
            })
            .collect();

        Some(MetricsRates {
            elapsed,
            pipeline,
            sinks,
        })
    }
}

/// Calculate rate per second
#[inline]
fn rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    let delta = current.saturating_sub(previous);
    delta as f64 / elapsed_secs
}

/// Calculated rates between two snapshots
#[derive(Debug, Clone)]
pub struct MetricsRates {
    /// Time elapsed between snapshots
    pub elapsed: Duration,

    /// Pipeline rates
    pub pipeline: Option<PipelineRates>,

    /// Per-sink rates
    pub sinks: Vec<SinkRates>,
}

/// Pipeline rates
#[derive(Debug, Clone, Copy)]
pub struct PipelineRates {
    /// Results collected per second
    pub results_per_sec: f64,
    /// Successful deliveries per second
    pub deliveries_per_sec: f64,
    /// Work dropped during the interval
    pub dropped: u64,
}

/// Per-sink rates
#[derive(Debug, Clone)]
pub struct SinkRates {
    /// Sink name
    pub name: String,
    /// Sink type
    pub sink_type: String,
    /// Results written per second
    pub results_per_sec: f64,
    /// Errors during the interval
    pub errors: u64,
    /// Skipped calls during the interval
    pub skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, secs: u64, pipeline: PipelineSnapshot, written: u64) -> CollectedMetrics {
        CollectedMetrics {
            timestamp: Some(base + Duration::from_secs(secs)),
            pipeline: Some(pipeline),
            sinks: vec![CollectedSink {
                name: "console".into(),
                sink_type: "stdout".into(),
                snapshot: SinkMetricsSnapshot {
                    results_written: written,
                    write_errors: written / 10,
                    ..Default::default()
                },
            }],
        }
    }

    #[test]
    fn test_rates() {
        let base = Instant::now();
        let prev = at(
            base,
            0,
            PipelineSnapshot {
                results_collected: 100,
                queries_rejected: 1,
                ..Default::default()
            },
            100,
        );
        let current = at(
            base,
            10,
            PipelineSnapshot {
                results_collected: 600,
                deliveries_succeeded: 200,
                queries_rejected: 3,
                deliveries_expired: 2,
                ..Default::default()
            },
            300,
        );

        let rates = current.rates(&prev).unwrap();
        assert_eq!(rates.elapsed, Duration::from_secs(10));

        let pipeline = rates.pipeline.unwrap();
        assert_eq!(pipeline.results_per_sec, 50.0);
        assert_eq!(pipeline.deliveries_per_sec, 20.0);
        assert_eq!(pipeline.dropped, 4);

        assert_eq!(rates.sinks.len(), 1);
        assert_eq!(rates.sinks[0].results_per_sec, 20.0);
        assert_eq!(rates.sinks[0].errors, 20);
    }

    #[test]
    fn test_rates_zero_elapsed() {
        let base = Instant::now();
        let a = at(base, 5, PipelineSnapshot::default(), 0);
        let b = at(base, 5, PipelineSnapshot::default(), 0);
        assert!(a.rates(&b).is_none());
    }

    #[test]
    fn test_rates_unmatched_sink() {
        let base = Instant::now();
        let prev = CollectedMetrics {
            timestamp: Some(base),
            ..Default::default()
        };
        let current = at(base, 1, PipelineSnapshot::default(), 10);

        let rates = current.rates(&prev).unwrap();
        assert!(rates.pipeline.is_none());
        assert!(rates.sinks.is_empty());
    }
}
