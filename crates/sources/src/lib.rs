//! Harvest - Sources
//!
//! Metric sources resolve a query pattern to the set of matching entities
//! and read the requested attributes from each of them.
//!
//! # Available Sources
//!
//! - **System** - Host CPU, memory, load and uptime via `sysinfo`
//! - **Static** - Fixed in-memory entities (tests, demos, smoke checks)
//!
//! # Failure model
//!
//! A source returns `Err` only when the whole query cannot be answered.
//! Entities that match but cannot be read are listed in
//! `QueryOutcome::failures` and do not affect the other entities.

mod error;
mod pattern;
mod static_registry;
mod system;

use std::sync::Arc;

use async_trait::async_trait;
use harvest_config::SourceConfig;
use harvest_protocol::QueryOutcome;

pub use error::{Result, SourceError};
pub use pattern::EntityPattern;
pub use static_registry::StaticRegistry;
pub use system::SystemRegistry;

/// A registry of named entities exposing readable attributes
///
/// Implementations are shared by every collection worker and must allow
/// concurrent queries.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Read `attributes` from every entity matching `pattern`
    async fn query_attributes(&self, pattern: &str, attributes: &[String]) -> Result<QueryOutcome>;
}

/// Build the configured metric source
pub fn build_source(config: &SourceConfig) -> Arc<dyn MetricSource> {
    match config {
        SourceConfig::System(c) => Arc::new(SystemRegistry::from_config(c)),
        SourceConfig::Static(c) => Arc::new(StaticRegistry::from_config(c)),
    }
}
