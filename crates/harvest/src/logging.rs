//! Tracing subscriber setup
//!
//! Level: `--log-level` flag, then `[log] level`, then `RUST_LOG`-style
//! directives are accepted as well (`harvest_pipeline=debug,info`).

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use harvest_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber
pub fn init(config: &LogConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(config.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let writer = make_writer(&config.output)?;

    match config.format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(matches!(config.output, LogOutput::Stderr | LogOutput::Stdout))
                    .with_writer(writer),
            )
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .with(filter)
            .init(),
    }

    Ok(())
}

fn make_writer(output: &LogOutput) -> Result<BoxMakeWriter> {
    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file '{path}'"))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };
    Ok(writer)
}
