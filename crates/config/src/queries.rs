//! Query configuration
//!
//! Each `[[queries]]` entry becomes one `Query` evaluated every cycle.

use harvest_protocol::{MetricKind, Query};
use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// One configured query
///
/// # Example
///
/// ```toml
/// [[queries]]
/// pattern = "system:type=Memory"
/// attributes = ["total", "used"]
/// alias = "memory"
/// kind = "gauge"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Entity pattern (`*` and `?` wildcards)
    pub pattern: String,

    /// Attributes to read from every matched entity
    pub attributes: Vec<String>,

    /// Prefix replacing the entity name in result names
    #[serde(default)]
    pub alias: Option<String>,

    /// Kind assigned to the results
    /// Default: unknown
    #[serde(default)]
    pub kind: MetricKind,
}

impl QueryConfig {
    /// Build the runtime query
    ///
    /// `index` is the position of the entry in the file, used in errors.
    pub fn to_query(&self, index: usize) -> Result<Query> {
        let query = Query::new(self.pattern.as_str(), self.attributes.iter().cloned())
            .map_err(|e| ConfigError::invalid_query(index, e))?
            .with_kind(self.kind);

        Ok(match &self.alias {
            Some(alias) => query.with_alias(alias.as_str()),
            None => query,
        })
    }
}
