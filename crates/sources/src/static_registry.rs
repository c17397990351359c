//! In-memory metric source
//!
//! Serves a fixed set of named entities. Values can be updated at runtime,
//! and entities can be marked unreadable to exercise partial failures.

use std::collections::BTreeMap;

use async_trait::async_trait;
use harvest_config::StaticSourceConfig;
use harvest_protocol::{AttributeSample, MetricValue, QueryOutcome};
use parking_lot::RwLock;

use crate::MetricSource;
use crate::error::Result;
use crate::pattern::EntityPattern;

#[derive(Debug, Clone, Default)]
struct Entity {
    attributes: BTreeMap<String, MetricValue>,
    unreadable: Option<String>,
}

/// In-memory registry of named entities
#[derive(Debug, Default)]
pub struct StaticRegistry {
    entities: RwLock<BTreeMap<String, Entity>>,
}

impl StaticRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from configuration
    pub fn from_config(config: &StaticSourceConfig) -> Self {
        let registry = Self::new();
        for entity in &config.entities {
            registry.register(entity.name.as_str());
            for (attribute, value) in &entity.attributes {
                registry.set(entity.name.as_str(), attribute.as_str(), value.clone());
            }
        }
        registry
    }

    /// Register an entity without attributes
    pub fn register(&self, entity: impl Into<String>) {
        self.entities.write().entry(entity.into()).or_default();
    }

    /// Set an attribute value, registering the entity when needed
    pub fn set(
        &self,
        entity: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<MetricValue>,
    ) {
        self.entities
            .write()
            .entry(entity.into())
            .or_default()
            .attributes
            .insert(attribute.into(), value.into());
    }

    /// Make an entity fail every read with `reason`
    pub fn set_unreadable(&self, entity: impl Into<String>, reason: impl Into<String>) {
        self.entities.write().entry(entity.into()).or_default().unreadable = Some(reason.into());
    }

    /// Make a previously unreadable entity readable again
    pub fn set_readable(&self, entity: &str) {
        if let Some(e) = self.entities.write().get_mut(entity) {
            e.unreadable = None;
        }
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Whether no entity is registered
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

#[async_trait]
impl MetricSource for StaticRegistry {
    fn name(&self) -> &str {
        "static"
    }

    async fn query_attributes(&self, pattern: &str, attributes: &[String]) -> Result<QueryOutcome> {
        let pattern = EntityPattern::compile(pattern)?;
        let entities = self.entities.read();
        let mut outcome = QueryOutcome::new();

        for (name, entity) in entities.iter().filter(|(name, _)| pattern.matches(name)) {
            if let Some(ref reason) = entity.unreadable {
                outcome.push_failure(name.as_str(), reason.as_str());
                continue;
            }

            let mut missing = Vec::new();
            for attribute in attributes {
                match entity.attributes.get(attribute) {
                    Some(value) => outcome.push_sample(AttributeSample::new(
                        name.as_str(),
                        attribute.as_str(),
                        value.clone(),
                    )),
                    None => missing.push(attribute.as_str()),
                }
            }

            if !missing.is_empty() {
                outcome.push_failure(
                    name.as_str(),
                    format!("unknown attributes: {}", missing.join(", ")),
                );
            }
        }

        Ok(outcome)
    }
}
