//! Check command
//!
//! Loads and validates the configuration, then prints what a run would
//! collect and where it would deliver it.
//!
//! # Usage
//!
//! ```bash
//! harvest check
//! harvest check --config configs/harvest.toml
//! ```

use std::path::Path;

use anyhow::Result;
use harvest_config::{Config, SinkConfig};
use owo_colors::OwoColorize;

pub fn run(path: Option<&Path>) -> Result<()> {
    let source = path.map_or_else(|| "(default)".to_string(), |p| p.display().to_string());

    println!();
    println!("{}", "Harvest Config Check".bold());
    println!("{}", "─".repeat(50));
    println!("Config        {}", source.cyan());
    println!("{}", "─".repeat(50));
    println!();

    print!("Loading configuration... ");
    let config = match super::load_config(path) {
        Ok(config) => {
            println!("{}", "✓".green());
            config
        }
        Err(e) => {
            println!("{}", "✗".red());
            println!("  {}", format!("{e:#}").red());
            return Err(e);
        }
    };

    print_summary(&config);

    println!();
    println!("{}", "Configuration is valid".green().bold());
    Ok(())
}

fn print_summary(config: &Config) {
    let global = &config.global;

    println!();
    println!("{}", "Global".bold());
    println!("  Period            {:?}", global.period);
    println!(
        "  Collection pool   {} workers, queue {}",
        global.collection_workers, global.collection_queue
    );
    println!(
        "  Delivery pool     {} workers, queue {}",
        global.delivery_workers, global.delivery_queue
    );
    println!("  Shutdown timeout  {:?}", global.shutdown_timeout);

    println!();
    println!("{} {}", "Source".bold(), config.source.type_name().cyan());

    println!();
    println!("{} ({})", "Queries".bold(), config.queries.len());
    for query in &config.queries {
        let alias = query
            .alias
            .as_deref()
            .map(|a| format!(" as {a}"))
            .unwrap_or_default();
        println!(
            "  {}{} [{}] {}",
            query.pattern,
            alias.dimmed(),
            query.attributes.join(", "),
            query.kind.as_str().dimmed()
        );
    }

    println!();
    println!("{} ({})", "Sinks".bold(), config.sinks.len());
    let mut sinks: Vec<(&String, &SinkConfig)> = config.sinks.iter().collect();
    sinks.sort_by(|a, b| a.0.cmp(b.0));
    for (name, sink) in sinks {
        let state = if sink.is_enabled() {
            "enabled".green().to_string()
        } else {
            "disabled".dimmed().to_string()
        };
        println!(
            "  {:<16} {:<8} {}  {}",
            name,
            sink.type_name(),
            state,
            describe(sink).dimmed()
        );
    }
}

/// One-line description of a sink's decorators
fn describe(sink: &SinkConfig) -> String {
    let batching = match sink.batch_size() {
        0 => "unbatched".to_string(),
        n => format!("batch {n}"),
    };
    let breaker = sink.circuit_breaker();
    let breaker = if breaker.enabled {
        format!(
            "breaker {}x/{:?}",
            breaker.max_failures, breaker.disable_duration
        )
    } else {
        "no breaker".to_string()
    };

    match sink {
        SinkConfig::Rate(rate) => format!(
            "{batching}, {breaker}, window {} -> {}",
            rate.window,
            rate.output.type_name()
        ),
        _ => format!("{batching}, {breaker}"),
    }
}
