//! Metric source configuration
//!
//! Exactly one source backs a running agent. The source resolves query
//! patterns to entities and reads their attributes.

use std::collections::BTreeMap;

use harvest_protocol::MetricValue;
use serde::Deserialize;

/// Configuration of the metric source
///
/// # Example
///
/// ```toml
/// [source]
/// type = "static"
///
/// [[source.entities]]
/// name = "app:name=web"
/// attributes = { requests = 10, latency_ms = 3.5 }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Host metrics (CPU, memory, load, uptime)
    System(SystemSourceConfig),

    /// Fixed in-memory entities, mostly for testing and demos
    Static(StaticSourceConfig),
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::System(SystemSourceConfig::default())
    }
}

impl SourceConfig {
    /// Get the source type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::System(_) => "system",
            Self::Static(_) => "static",
        }
    }
}

/// Host metrics source configuration
///
/// Exposes the entities `system:type=Cpu`, `system:type=Memory`,
/// `system:type=Load` and `system:type=Uptime`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SystemSourceConfig {
    /// Prefix replacing `system` in entity names
    /// Default: none
    pub domain: Option<String>,
}

impl SystemSourceConfig {
    /// Entity domain (`system` unless overridden)
    pub fn domain(&self) -> &str {
        self.domain.as_deref().unwrap_or("system")
    }
}

/// In-memory source configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaticSourceConfig {
    /// Entities served by the source
    pub entities: Vec<StaticEntityConfig>,
}

/// One entity of the static source
#[derive(Debug, Clone, Deserialize)]
pub struct StaticEntityConfig {
    /// Entity name matched against query patterns
    pub name: String,

    /// Attribute values
    #[serde(default)]
    pub attributes: BTreeMap<String, MetricValue>,
}
