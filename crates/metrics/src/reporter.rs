//! Periodic report of the agent's own counters
//!
//! One report combines the pipeline snapshot with every sink's snapshot,
//! plus per-second rates against the previous report. Reports are logged
//! line by line through `tracing`.

use std::sync::Arc;
use std::time::Instant;

use harvest_config::{MetricsConfig, MetricsFormat};
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::format::MetricsFormatter;
use crate::{
    CollectedMetrics, CollectedSink, HumanFormatter, JsonFormatter, PipelineMetricsProvider,
    SinkMetricsProvider,
};

/// Reporter over the pipeline and its sinks
pub struct UnifiedReporter {
    config: MetricsConfig,
    formatter: Box<dyn MetricsFormatter>,
    pipeline: Arc<dyn PipelineMetricsProvider>,
    sinks: Vec<Arc<dyn SinkMetricsProvider>>,
    previous: Option<CollectedMetrics>,
}

impl UnifiedReporter {
    /// Report `pipeline` and `sinks` as `config` asks
    pub fn new(
        config: MetricsConfig,
        pipeline: Arc<dyn PipelineMetricsProvider>,
        sinks: Vec<Arc<dyn SinkMetricsProvider>>,
    ) -> Self {
        let formatter: Box<dyn MetricsFormatter> = match config.format {
            MetricsFormat::Human => Box::new(HumanFormatter::new()),
            MetricsFormat::Json => Box::new(JsonFormatter::new()),
        };
        Self {
            config,
            formatter,
            pipeline,
            sinks,
            previous: None,
        }
    }

    /// Report every interval until `cancel` fires, then once more
    ///
    /// The last report covers the partial interval before cancellation, so
    /// callers cancel after the pipeline has stopped to log final totals.
    pub async fn run(mut self, cancel: CancellationToken) {
        let every = self.config.interval;
        let mut ticker = interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(interval_ms = every.as_millis() as u64, "metrics reporter running");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.report(),
            }
        }

        self.report();
    }

    /// Log one report now
    pub fn report(&mut self) {
        for line in self.render().lines() {
            info!("{line}");
        }
    }

    fn render(&mut self) -> String {
        let current = self.snapshot();
        let rates = self
            .previous
            .as_ref()
            .and_then(|previous| current.rates(previous));
        let output = self.formatter.format_unified(&current, rates.as_ref());
        self.previous = Some(current);
        output
    }

    fn snapshot(&self) -> CollectedMetrics {
        let pipeline = self
            .config
            .include_pipeline
            .then(|| self.pipeline.pipeline_snapshot());

        let sinks = if self.config.include_sinks {
            self.sinks
                .iter()
                .map(|sink| CollectedSink {
                    name: sink.sink_name().to_string(),
                    sink_type: sink.sink_type().to_string(),
                    snapshot: sink.snapshot(),
                })
                .collect()
        } else {
            Vec::new()
        };

        CollectedMetrics {
            timestamp: Some(Instant::now()),
            pipeline,
            sinks,
        }
    }
}

impl std::fmt::Debug for UnifiedReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifiedReporter")
            .field("interval", &self.config.interval)
            .field("format", &self.config.format)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
