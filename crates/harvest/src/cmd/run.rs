//! Run command - Collect until interrupted
//!
//! Starts the pipeline and the metrics reporter, then waits for SIGINT or
//! SIGTERM and shuts both down.

use anyhow::{Context, Result};
use harvest_config::Config;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::assembly::{Assembly, assemble};

/// Run the collection agent until a shutdown signal arrives
pub async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        source = config.source.type_name(),
        queries = config.queries.len(),
        sinks = ?config.enabled_sinks(),
        period_ms = config.global.period.as_millis() as u64,
        "harvest starting"
    );

    if let Err(e) = run_agent(config).await {
        error!(error = %e, "harvest error");
        return Err(e);
    }

    info!("harvest shutdown complete");
    Ok(())
}

async fn run_agent(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let assembly = assemble(&config)?;

    let metrics_task = if config.metrics.enabled {
        let reporter = assembly.reporter(&config);
        let cancel = cancel.clone();
        Some(tokio::spawn(async move {
            reporter.run(cancel).await;
        }))
    } else {
        info!("metrics reporting disabled");
        None
    };

    let Assembly { coordinator, .. } = assembly;
    coordinator.start().context("failed to start pipeline")?;

    wait_for_shutdown().await?;
    info!("shutdown signal received, stopping pipeline...");

    let stopped = coordinator.stop().await;

    // final report after the last deliveries
    cancel.cancel();
    if let Some(task) = metrics_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "metrics reporter panicked");
    }

    stopped.context("pipeline did not stop cleanly")
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = signal::ctrl_c() => result.context("failed to listen for Ctrl+C")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    Ok(())
}
