//! Configuration validation
//!
//! Validates config consistency:
//! - Pool sizes, queue capacities and the collection period are non-zero
//! - Every query is well formed
//! - At least one sink is enabled
//! - Sink specific fields (rate windows, nested outputs) are usable
//! - Static source entities are named

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sinks::SinkConfig;
use crate::sources::SourceConfig;

/// Smallest rate window able to produce a rate
const MIN_RATE_WINDOW: usize = 2;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_global(config)?;
    validate_source(config)?;
    validate_queries(config)?;
    validate_sinks(config)?;
    Ok(())
}

/// Validate global settings
fn validate_global(config: &Config) -> Result<()> {
    let global = &config.global;

    if global.period.is_zero() {
        return Err(ConfigError::invalid_value(
            "global",
            "global",
            "period",
            "must be greater than zero",
        ));
    }

    for (field, value) in [
        ("collection_workers", global.collection_workers),
        ("collection_queue", global.collection_queue),
        ("delivery_workers", global.delivery_workers),
        ("delivery_queue", global.delivery_queue),
    ] {
        if value == 0 {
            return Err(ConfigError::invalid_value(
                "global",
                "global",
                field,
                "must be greater than zero",
            ));
        }
    }

    Ok(())
}

/// Validate the metric source
fn validate_source(config: &Config) -> Result<()> {
    if let SourceConfig::Static(ref source) = config.source {
        if source.entities.is_empty() {
            return Err(ConfigError::missing_field("source", "static", "entities"));
        }
        for entity in &source.entities {
            if entity.name.trim().is_empty() {
                return Err(ConfigError::missing_field("source", "static", "name"));
            }
        }
    }

    Ok(())
}

/// Validate query definitions
fn validate_queries(config: &Config) -> Result<()> {
    if config.queries.is_empty() {
        return Err(ConfigError::NoQueries);
    }

    for (index, query) in config.queries.iter().enumerate() {
        query.to_query(index)?;
    }

    Ok(())
}

/// Validate sink configurations
fn validate_sinks(config: &Config) -> Result<()> {
    if config.enabled_sinks().is_empty() {
        return Err(ConfigError::NoSinksEnabled);
    }

    for (name, sink) in config.sinks.iter() {
        if sink.is_enabled() {
            validate_sink(name, sink)?;
        }
    }

    Ok(())
}

fn validate_sink(name: &str, sink: &SinkConfig) -> Result<()> {
    if let SinkConfig::Rate(rate) = sink {
        if rate.window < MIN_RATE_WINDOW {
            return Err(ConfigError::invalid_value(
                "sink",
                name,
                "window",
                format!("must be at least {}", MIN_RATE_WINDOW),
            ));
        }
        if !rate.output.is_enabled() {
            return Err(ConfigError::invalid_value(
                "sink",
                name,
                "output",
                "nested output sink must be enabled",
            ));
        }
        validate_sink(name, &rate.output)?;
    }

    let cb = sink.circuit_breaker();
    if cb.enabled && cb.max_failures == 0 {
        return Err(ConfigError::invalid_value(
            "sink",
            name,
            "max_failures",
            "must be greater than zero",
        ));
    }

    Ok(())
}
