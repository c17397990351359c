//! Harvest Protocol - Core value types for the collection pipeline
//!
//! This crate provides the types that flow through the pipeline:
//! - `Query` - A pattern to resolve against the metric source plus the
//!   attributes to extract from every matched entity
//! - `AttributeSample` / `QueryOutcome` - Raw values returned by a source
//! - `MetricResult` - The immutable value delivered to sinks
//! - `MetricKind` / `MetricValue` - Classification and payload of a result
//! - `Clock` - Epoch millisecond time source shared by deadlines and breakers
//!
//! # Design Principles
//!
//! - **Immutable**: Queries and results never change after construction
//! - **Arc-friendly**: Both are shared across worker tasks via `Arc`
//! - **No I/O**: Pure data, no dependency on the runtime

pub mod clock;
mod error;
mod query;
mod result;
mod sample;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ProtocolError;
pub use query::Query;
pub use result::{MetricKind, MetricResult, MetricValue};
pub use sample::{AttributeSample, EntityFailure, QueryOutcome};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod query_test;
