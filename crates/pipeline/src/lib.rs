//! Harvest - Pipeline
//!
//! The scheduled collection-and-dispatch pipeline: a periodic generator
//! feeds queries to a collection pool, every collected result is delivered
//! to every sink on a separate delivery pool.
//!
//! # Architecture
//!
//! ```text
//!  [Timer] ──wake──► QueryGenerator ──query──► CollectionStage ──result──► ResultDispatchStage
//!     ▲                    │              (collection pool)            (delivery pool)
//!     └──── wake + period ─┘                     │                           │
//!                                          MetricSource                  MetricSink × M
//! ```
//!
//! # Key Design
//!
//! - **Deadline admission**: every task of a cycle carries the cycle deadline
//!   (`now + period`) and is dropped unrun if it starts after it
//! - **Bounded pools**: `try_send` into bounded queues; a full queue rejects
//!   the task instead of growing
//! - **Isolation**: collection and delivery run on separate pools, so a slow
//!   sink never holds up collection
//! - **Wake-time scheduling**: the next cycle is planned from the previous
//!   wake, so cycles may overlap under load
//!
//! # Example
//!
//! ```ignore
//! use harvest_pipeline::{Coordinator, PipelineConfig, Schedule, SystemClock};
//!
//! let schedule = Schedule::new(period, queries, sinks)?;
//! let coordinator = Coordinator::new(PipelineConfig::default(), source, schedule, Arc::new(SystemClock));
//!
//! coordinator.start()?;
//! // ...
//! coordinator.stop().await?;
//! ```

pub mod clock;

mod collection;
mod coordinator;
mod deadline;
mod dispatch;
mod error;
mod generator;
mod metrics;
mod pool;
mod schedule;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use collection::CollectionStage;
pub use coordinator::{Coordinator, CoordinatorState, PipelineConfig};
pub use deadline::{Deadline, DeadlineTask};
pub use dispatch::ResultDispatchStage;
pub use error::{PipelineError, Result};
pub use generator::QueryGenerator;
pub use metrics::{PipelineMetrics, PipelineMetricsHandle};
pub use pool::{Job, PoolConfig, WorkerPool};
pub use schedule::{Schedule, SinkSet};
pub use timer::{Timer, TimerJob};
