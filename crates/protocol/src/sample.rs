//! Raw values returned by a metric source

use crate::result::MetricValue;

/// One attribute value read from one matched entity
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSample {
    /// Name of the matched entity
    pub entity: String,
    /// Attribute name
    pub attribute: String,
    /// Raw attribute value
    pub value: MetricValue,
}

impl AttributeSample {
    /// Create a new sample
    pub fn new(
        entity: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self {
            entity: entity.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// A matched entity that could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFailure {
    /// Name of the matched entity
    pub entity: String,
    /// Reason the entity could not be read
    pub reason: String,
}

/// Everything a source returned for one query
///
/// Failures of individual entities do not fail the query; they are
/// reported alongside the samples that could be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// Successfully read attribute values
    pub samples: Vec<AttributeSample>,
    /// Entities that matched but could not be read
    pub failures: Vec<EntityFailure>,
}

impl QueryOutcome {
    /// Create an empty outcome
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample
    pub fn push_sample(&mut self, sample: AttributeSample) {
        self.samples.push(sample);
    }

    /// Record an entity failure
    pub fn push_failure(&mut self, entity: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(EntityFailure {
            entity: entity.into(),
            reason: reason.into(),
        });
    }

    /// True when nothing matched at all
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty() && self.failures.is_empty()
    }
}
