//! Host metrics source
//!
//! Exposes host statistics as four entities:
//!
//! | Entity | Attributes |
//! |--------|------------|
//! | `system:type=Cpu` | `usage`, `cores` |
//! | `system:type=Memory` | `total`, `used`, `available`, `used_percent`, `swap_total`, `swap_used` |
//! | `system:type=Load` | `one`, `five`, `fifteen` |
//! | `system:type=Uptime` | `seconds`, `boot_time` |
//!
//! The `system` domain can be renamed through configuration.

use async_trait::async_trait;
use harvest_config::SystemSourceConfig;
use harvest_protocol::{AttributeSample, MetricValue, QueryOutcome};
use parking_lot::Mutex;
use sysinfo::System;

use crate::MetricSource;
use crate::error::Result;
use crate::pattern::EntityPattern;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Cpu,
    Memory,
    Load,
    Uptime,
}

impl Group {
    const ALL: [Group; 4] = [Group::Cpu, Group::Memory, Group::Load, Group::Uptime];

    fn type_name(&self) -> &'static str {
        match self {
            Self::Cpu => "Cpu",
            Self::Memory => "Memory",
            Self::Load => "Load",
            Self::Uptime => "Uptime",
        }
    }
}

/// Host metrics registry backed by `sysinfo`
pub struct SystemRegistry {
    domain: String,
    system: Mutex<System>,
}

impl SystemRegistry {
    /// Create a registry using the `system` domain
    pub fn new() -> Self {
        Self::with_domain("system")
    }

    /// Create a registry with a custom entity domain
    pub fn with_domain(domain: impl Into<String>) -> Self {
        let mut system = System::new();
        // CPU usage is a delta; prime the first measurement
        system.refresh_cpu_all();
        Self {
            domain: domain.into(),
            system: Mutex::new(system),
        }
    }

    /// Create a registry from configuration
    pub fn from_config(config: &SystemSourceConfig) -> Self {
        Self::with_domain(config.domain())
    }

    /// Names of all exposed entities
    pub fn entity_names(&self) -> Vec<String> {
        Group::ALL.iter().map(|g| self.entity_name(*g)).collect()
    }

    fn entity_name(&self, group: Group) -> String {
        format!("{}:type={}", self.domain, group.type_name())
    }

    fn read(system: &mut System, group: Group, attribute: &str) -> Option<MetricValue> {
        let value = match (group, attribute) {
            (Group::Cpu, "usage") => MetricValue::Float(f64::from(system.global_cpu_usage())),
            (Group::Cpu, "cores") => MetricValue::from(system.cpus().len() as u64),
            (Group::Memory, "total") => MetricValue::from(system.total_memory()),
            (Group::Memory, "used") => MetricValue::from(system.used_memory()),
            (Group::Memory, "available") => MetricValue::from(system.available_memory()),
            (Group::Memory, "used_percent") => {
                let total = system.total_memory();
                let pct = if total > 0 {
                    system.used_memory() as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                MetricValue::Float(pct)
            }
            (Group::Memory, "swap_total") => MetricValue::from(system.total_swap()),
            (Group::Memory, "swap_used") => MetricValue::from(system.used_swap()),
            (Group::Load, "one") => MetricValue::Float(System::load_average().one),
            (Group::Load, "five") => MetricValue::Float(System::load_average().five),
            (Group::Load, "fifteen") => MetricValue::Float(System::load_average().fifteen),
            (Group::Uptime, "seconds") => MetricValue::from(System::uptime()),
            (Group::Uptime, "boot_time") => MetricValue::from(System::boot_time()),
            _ => return None,
        };
        Some(value)
    }
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricSource for SystemRegistry {
    fn name(&self) -> &str {
        "system"
    }

    async fn query_attributes(&self, pattern: &str, attributes: &[String]) -> Result<QueryOutcome> {
        let pattern = EntityPattern::compile(pattern)?;
        let mut outcome = QueryOutcome::new();
        let mut system = self.system.lock();

        for group in Group::ALL {
            let entity = self.entity_name(group);
            if !pattern.matches(&entity) {
                continue;
            }

            match group {
                Group::Cpu => system.refresh_cpu_all(),
                Group::Memory => system.refresh_memory(),
                Group::Load | Group::Uptime => {}
            }

            let mut missing = Vec::new();
            for attribute in attributes {
                match Self::read(&mut system, group, attribute) {
                    Some(value) => outcome.push_sample(AttributeSample::new(
                        entity.as_str(),
                        attribute.as_str(),
                        value,
                    )),
                    None => missing.push(attribute.as_str()),
                }
            }

            if !missing.is_empty() {
                outcome.push_failure(
                    entity.as_str(),
                    format!("unknown attributes: {}", missing.join(", ")),
                );
            }
        }

        Ok(outcome)
    }
}
