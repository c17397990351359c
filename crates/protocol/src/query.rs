//! Query definition
//!
//! A `Query` names a pattern to resolve against the metric source and the
//! attributes to read from every entity the pattern matches.

use std::fmt;

use crate::error::ProtocolError;
use crate::result::MetricKind;

/// A metric query
///
/// Queries are created once from configuration and shared (as `Arc<Query>`)
/// by every collection cycle. They are never mutated after construction.
///
/// # Example
///
/// ```
/// use harvest_protocol::{MetricKind, Query};
///
/// let query = Query::new("system:type=Memory", ["total", "used"])
///     .unwrap()
///     .with_alias("memory")
///     .with_kind(MetricKind::Gauge);
///
/// assert_eq!(query.result_name("system:type=Memory", "used"), "memory.used");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Entity pattern (may match zero, one or many entities)
    pattern: String,

    /// Attribute names to extract from each matched entity
    attributes: Vec<String>,

    /// Optional prefix replacing the entity name in result names
    alias: Option<String>,

    /// Kind assigned to every result of this query
    kind: MetricKind,
}

impl Query {
    /// Create a new query
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is empty, no attributes are given,
    /// or one of the attribute names is empty.
    pub fn new<I, S>(pattern: impl Into<String>, attributes: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(ProtocolError::EmptyPattern);
        }

        let attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        if attributes.is_empty() {
            return Err(ProtocolError::no_attributes(pattern));
        }
        if attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(ProtocolError::empty_attribute(pattern));
        }

        Ok(Self {
            pattern,
            attributes,
            alias: None,
            kind: MetricKind::Unknown,
        })
    }

    /// Set the alias used as result name prefix
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        self.alias = if alias.is_empty() { None } else { Some(alias) };
        self
    }

    /// Set the kind of every result produced by this query
    pub fn with_kind(mut self, kind: MetricKind) -> Self {
        self.kind = kind;
        self
    }

    /// Entity pattern
    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Attribute names to extract
    #[inline]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Result name alias, if any
    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Kind assigned to results
    #[inline]
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Build the result name for an attribute read from `entity`
    ///
    /// The alias replaces the entity name when set.
    pub fn result_name(&self, entity: &str, attribute: &str) -> String {
        let prefix = self.alias.as_deref().unwrap_or(entity);
        format!("{}.{}", prefix, attribute)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.pattern, self.attributes.join(","))
    }
}
