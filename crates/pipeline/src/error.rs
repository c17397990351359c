//! Pipeline error types

use thiserror::Error;

use harvest_sinks::SinkError;

use crate::coordinator::CoordinatorState;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A worker pool queue was full
    #[error("pool '{pool}' rejected the task: queue full")]
    Rejected { pool: String },

    /// A worker pool or timer no longer accepts work
    #[error("'{pool}' is shut down")]
    PoolShutdown { pool: String },

    /// Lifecycle method called in the wrong state
    #[error("cannot {operation} coordinator in state {state}")]
    InvalidState {
        operation: &'static str,
        state: CoordinatorState,
    },

    /// Bad constructor argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No tokio runtime to spawn workers on
    #[error("no async runtime available: {0}")]
    Runtime(String),

    /// A sink failed while the pipeline was closing it
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl PipelineError {
    /// Create a rejected-submission error
    pub fn rejected(pool: impl Into<String>) -> Self {
        Self::Rejected { pool: pool.into() }
    }

    /// Create a shut-down error
    pub fn pool_shutdown(pool: impl Into<String>) -> Self {
        Self::PoolShutdown { pool: pool.into() }
    }

    /// Create an invalid-state error
    pub fn invalid_state(operation: &'static str, state: CoordinatorState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Whether the error is a refused submission (full or shut down)
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::PoolShutdown { .. })
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
