//! Pipeline assembly from configuration
//!
//! Builds the source, the decorated sinks and the schedule described by a
//! `Config` and hands them to a coordinator.

use std::sync::Arc;

use anyhow::{Context, Result};
use harvest_config::Config;
use harvest_metrics::{SinkMetricsProvider, UnifiedReporter};
use harvest_pipeline::{Coordinator, PipelineConfig, Schedule, SystemClock};
use harvest_protocol::Clock;
use harvest_sinks::{MetricSink, build_sinks};
use harvest_sources::build_source;

/// A coordinator ready to start, plus the handles the reporter reads
pub struct Assembly {
    pub coordinator: Coordinator,
    pub sink_metrics: Vec<Arc<dyn SinkMetricsProvider>>,
}

impl Assembly {
    /// Build the unified metrics reporter over the pipeline and every sink
    pub fn reporter(&self, config: &Config) -> UnifiedReporter {
        UnifiedReporter::new(
            config.metrics.clone(),
            Arc::new(self.coordinator.metrics_handle()),
            self.sink_metrics.clone(),
        )
    }
}

/// Assemble the pipeline described by `config`
pub fn assemble(config: &Config) -> Result<Assembly> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let source = build_source(&config.source);
    let queries = config.build_queries().context("invalid query configuration")?;

    let built = build_sinks(&config.sinks, Arc::clone(&clock)).context("failed to build sinks")?;
    let mut sinks: Vec<Arc<dyn MetricSink>> = Vec::with_capacity(built.len());
    let mut sink_metrics: Vec<Arc<dyn SinkMetricsProvider>> = Vec::with_capacity(built.len());
    for sink in built {
        tracing::debug!(
            sink = %sink.sink.name(),
            sink_type = sink.sink.sink_type(),
            "sink ready"
        );
        sinks.push(sink.sink);
        sink_metrics.push(Arc::new(sink.metrics));
    }

    let schedule = Schedule::new(config.global.period, queries, sinks)
        .context("invalid collection schedule")?;

    let coordinator = Coordinator::new(
        PipelineConfig::from_global(&config.global),
        source,
        schedule,
        clock,
    );

    Ok(Assembly {
        coordinator,
        sink_metrics,
    })
}
