//! Once command - Run a single collection cycle
//!
//! Starts the pipeline, which submits its first cycle immediately, then
//! stops it right away. Stopping drains both pools, so every result of the
//! cycle is delivered and every batch window flushed before exit.

use anyhow::{Context, Result};
use harvest_config::Config;
use harvest_metrics::PipelineMetricsProvider;
use tracing::info;

use crate::assembly::assemble;

/// Collect once and exit
pub async fn run(config: Config) -> Result<()> {
    let assembly = assemble(&config)?;
    let mut reporter = config.metrics.enabled.then(|| assembly.reporter(&config));
    let pipeline_metrics = assembly.coordinator.metrics_handle();

    let coordinator = assembly.coordinator;
    coordinator.start().context("failed to start pipeline")?;
    coordinator
        .stop()
        .await
        .context("pipeline did not stop cleanly")?;

    let snapshot = pipeline_metrics.pipeline_snapshot();
    info!(
        queries = snapshot.queries_submitted,
        results = snapshot.results_collected,
        delivered = snapshot.deliveries_succeeded,
        failed = snapshot.deliveries_failed + snapshot.queries_failed,
        dropped = snapshot.dropped(),
        "collection cycle complete"
    );

    if let Some(reporter) = reporter.as_mut() {
        reporter.report();
    }

    Ok(())
}
