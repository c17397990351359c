//! Sink assembly from configuration
//!
//! Every configured sink is wrapped the same way:
//!
//! ```text
//! BatchDispatcher(CircuitBreaker(sink))   when batch_size > 0
//! CircuitBreaker(sink)                    otherwise
//! ```
//!
//! The breaker sits inside the dispatcher so a disabled sink skips whole
//! windows, hooks included. A sink disabled in configuration is still
//! built, but its breaker never lets a call through.

use std::sync::Arc;

use harvest_config::{SinkConfig, SinksConfig};
use harvest_protocol::Clock;

use crate::batch::BatchDispatcher;
use crate::circuit_breaker::CircuitBreaker;
use crate::error::Result;
use crate::metrics::SinkMetricsHandle;
use crate::null::NullSink;
use crate::rate::RateSink;
use crate::stdout::StdoutSink;
use crate::traits::{BatchSink, MetricSink};

/// A sink ready for the delivery stage, plus its reporter handle
#[derive(Clone)]
pub struct BuiltSink {
    pub sink: Arc<dyn MetricSink>,
    pub metrics: SinkMetricsHandle,
}

impl std::fmt::Debug for BuiltSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltSink")
            .field("name", &self.sink.name())
            .field("sink_type", &self.sink.sink_type())
            .finish()
    }
}

/// Build one named sink with its decorators
pub fn build_sink(name: &str, config: &SinkConfig, clock: Arc<dyn Clock>) -> Result<BuiltSink> {
    let (base, metrics): (Box<dyn BatchSink>, SinkMetricsHandle) = match config {
        SinkConfig::Null(_) => {
            let sink = NullSink::new(name);
            let handle = sink.metrics_handle();
            (Box::new(sink), handle)
        }
        SinkConfig::Stdout(c) => {
            let sink = StdoutSink::from_config(name, c);
            let handle = sink.metrics_handle();
            (Box::new(sink), handle)
        }
        SinkConfig::Rate(c) => {
            let output = build_sink(&format!("{name}.output"), &c.output, Arc::clone(&clock))?;
            let sink = RateSink::new(name, c.window, output.sink)?;
            let handle = sink.metrics_handle();
            (Box::new(sink), handle)
        }
    };

    let breaker = CircuitBreaker::from_config(base, config.circuit_breaker(), clock)
        .with_enabled(config.is_enabled())
        .with_metrics(Arc::clone(metrics.metrics()));

    let sink: Arc<dyn MetricSink> = match config.batch_size() {
        0 => Arc::new(breaker),
        batch_size => Arc::new(
            BatchDispatcher::new(breaker, batch_size)?.with_metrics(Arc::clone(metrics.metrics())),
        ),
    };

    tracing::debug!(
        sink = %name,
        sink_type = config.type_name(),
        batch_size = config.batch_size(),
        enabled = config.is_enabled(),
        "sink built"
    );

    Ok(BuiltSink { sink, metrics })
}

/// Build every enabled sink, ordered by name
pub fn build_sinks(config: &SinksConfig, clock: Arc<dyn Clock>) -> Result<Vec<BuiltSink>> {
    let mut names: Vec<&String> = config
        .iter()
        .filter(|(_, c)| c.is_enabled())
        .map(|(name, _)| name)
        .collect();
    names.sort();

    names
        .into_iter()
        .filter_map(|name| config.get(name).map(|c| (name, c)))
        .map(|(name, c)| build_sink(name, c, Arc::clone(&clock)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_config::{
        CircuitBreakerConfig, NullSinkConfig, RateSinkConfig, StdoutSinkConfig,
    };
    use harvest_metrics::SinkMetricsProvider;
    use harvest_protocol::{ManualClock, MetricKind, MetricResult};

    fn clock() -> Arc<dyn Clock> {
        Arc::new(ManualClock::new(0))
    }

    fn result(value: i64, epoch_millis: i64) -> MetricResult {
        MetricResult::new("a.b", MetricKind::Counter, value, epoch_millis)
    }

    #[tokio::test]
    async fn test_unbatched_null_sink() {
        let built = build_sink("discard", &SinkConfig::Null(NullSinkConfig::default()), clock())
            .unwrap();

        assert_eq!(built.sink.name(), "discard");
        assert_eq!(built.sink.sink_type(), "null");
        assert_eq!(built.sink.write(&result(1, 0)).await.unwrap(), 1);
        assert_eq!(built.metrics.snapshot().results_written, 1);
    }

    #[tokio::test]
    async fn test_batched_sink_buffers() {
        let config = SinkConfig::Null(NullSinkConfig {
            batch_size: 2,
            ..Default::default()
        });
        let built = build_sink("discard", &config, clock()).unwrap();

        built.sink.write(&result(1, 0)).await.unwrap();
        built.sink.write(&result(2, 1)).await.unwrap();
        assert_eq!(built.metrics.snapshot().results_written, 0);

        built.sink.close().await.unwrap();
        assert_eq!(built.metrics.snapshot().results_written, 2);
        assert_eq!(built.metrics.snapshot().batches_flushed, 1);
    }

    #[tokio::test]
    async fn test_disabled_sink_skips() {
        let config = SinkConfig::Null(NullSinkConfig {
            enabled: false,
            ..Default::default()
        });
        let built = build_sink("off", &config, clock()).unwrap();

        assert_eq!(built.sink.write(&result(1, 0)).await.unwrap(), 0);
        assert_eq!(built.metrics.snapshot().results_written, 0);
        assert_eq!(built.metrics.snapshot().skipped, 1);
    }

    #[tokio::test]
    async fn test_rate_sink_with_nested_output() {
        let config = SinkConfig::Rate(RateSinkConfig {
            output: Box::new(SinkConfig::Null(NullSinkConfig::default())),
            ..Default::default()
        });
        let built = build_sink("rates", &config, clock()).unwrap();

        built.sink.write(&result(0, 0)).await.unwrap();
        assert_eq!(built.sink.write(&result(10, 1_000)).await.unwrap(), 1);
        assert_eq!(built.metrics.sink_type(), "rate");
        assert_eq!(built.metrics.snapshot().results_written, 1);
    }

    #[test]
    fn test_invalid_rate_window() {
        let config = SinkConfig::Rate(RateSinkConfig {
            window: 1,
            ..Default::default()
        });
        assert!(build_sink("rates", &config, clock()).is_err());
    }

    #[test]
    fn test_build_sinks_sorted_and_enabled_only() {
        let mut config = SinksConfig::default();
        config.insert("zeta", SinkConfig::Null(NullSinkConfig::default()));
        config.insert(
            "alpha",
            SinkConfig::Stdout(StdoutSinkConfig {
                circuit_breaker: CircuitBreakerConfig {
                    max_failures: 2,
                    ..Default::default()
                },
                ..Default::default()
            }),
        );
        config.insert(
            "off",
            SinkConfig::Null(NullSinkConfig {
                enabled: false,
                ..Default::default()
            }),
        );

        let built = build_sinks(&config, clock()).unwrap();
        let names: Vec<&str> = built.iter().map(|b| b.sink.name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
