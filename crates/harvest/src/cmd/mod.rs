//! Command implementations for the Harvest CLI

pub mod check;
pub mod once;
pub mod run;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use harvest_config::Config;

/// Built-in configuration used when no file is given or found
///
/// Host CPU, memory and load every 10 seconds, printed to stdout.
const DEFAULT_CONFIG: &str = r#"
[global]
period = "10s"

[source]
type = "system"

[[queries]]
pattern = "system:type=Cpu"
attributes = ["usage"]
alias = "cpu"
kind = "gauge"

[[queries]]
pattern = "system:type=Memory"
attributes = ["used", "available", "used_percent"]
alias = "memory"
kind = "gauge"

[[queries]]
pattern = "system:type=Load"
attributes = ["one", "five", "fifteen"]
alias = "load"
kind = "gauge"

[sinks.console]
type = "stdout"
"#;

/// Files tried, in order, when `--config` is not given
const DEFAULT_PATHS: [&str; 2] = ["configs/harvest.toml", "harvest.toml"];

/// Load the configuration for a command
///
/// An explicit path must exist. Without one the default locations are
/// tried, then the built-in configuration.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "config file not found: {}",
                path.display()
            ));
        }
        return Config::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    if let Some(path) = DEFAULT_PATHS.iter().map(PathBuf::from).find(|p| p.exists()) {
        return Config::from_file(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    Config::from_str(DEFAULT_CONFIG).context("built-in configuration is invalid")
}
