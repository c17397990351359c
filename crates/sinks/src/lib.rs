//! Harvest - Sinks
//!
//! Destinations for collected results and the decorators that protect the
//! pipeline from them.
//!
//! # Architecture
//!
//! The delivery stage calls `pre_collect`, `write` and `post_collect` on a
//! shared `Arc<dyn MetricSink>` for every result. Configured sinks are
//! wrapped before they get there:
//!
//! ```text
//! [Delivery worker] --&MetricResult--> [BatchDispatcher] --> [CircuitBreaker] --> [Sink]
//!                                       (batch_size > 0)
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `null` | Benchmarking (discard all) |
//! | `stdout` | Plain or JSON lines |
//! | `rate` | Per-second rates forwarded to a nested sink |
//! | `memory` | Records every call (tests, debugging) |
//!
//! # Example
//!
//! ```ignore
//! use harvest_sinks::build_sink;
//!
//! let built = build_sink("console", &sink_config, clock)?;
//! built.sink.write(&result).await?;
//! reporter_builder.sink(Arc::new(built.metrics));
//! ```

// =============================================================================
// Contracts and decorators
// =============================================================================

mod error;
mod traits;

/// Batch dispatcher - ordered windows with before/after hooks
pub mod batch;

/// Circuit breaker - temporarily disables failing sinks
pub mod circuit_breaker;

/// Sink assembly from configuration
pub mod build;

// =============================================================================
// Sink implementations
// =============================================================================

/// Memory sink - records every call
pub mod memory;

/// Null sink - discards all data (for benchmarking)
pub mod null;

/// Rate sink - per-second derivative of every metric
pub mod rate;

/// Stdout sink - plain or JSON lines
pub mod stdout;

// =============================================================================
// Shared utilities
// =============================================================================

mod metrics;

/// Evicting buffer and rate-limited logging
pub mod util;

pub use batch::BatchDispatcher;
pub use build::{BuiltSink, build_sink, build_sinks};
pub use circuit_breaker::{CircuitBreaker, DISABLE_DURATION, MAX_FAILURES};
pub use error::{Result, SinkError};
pub use metrics::SinkMetricsHandle;
pub use traits::{BatchSink, MetricSink};
