//! Harvest - Periodic metric collection agent
//!
//! # Usage
//!
//! ```bash
//! # Collect until SIGINT/SIGTERM (default)
//! harvest
//! harvest --config configs/harvest.toml
//!
//! # Run a single cycle, deliver everything, exit
//! harvest once
//!
//! # Validate a config file and print what it sets up
//! harvest check --config configs/harvest.toml
//! ```

mod assembly;
mod cmd;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Harvest - Periodic metric collection agent
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect on the configured period until interrupted
    Run,

    /// Run one collection cycle, drain it and exit
    Once,

    /// Validate configuration and print a summary
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let config = cmd::load_config(cli.config.as_deref())?;
            logging::init(&config.log, cli.log_level.as_deref())?;
            cmd::run::run(config).await
        }
        Command::Once => {
            let config = cmd::load_config(cli.config.as_deref())?;
            logging::init(&config.log, cli.log_level.as_deref())?;
            cmd::once::run(config).await
        }
        // Check doesn't need logging - just outputs to stdout
        Command::Check => cmd::check::run(cli.config.as_deref()),
    }
}
