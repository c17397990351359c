//! Sink error types

use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors raised by sinks and sink decorators
#[derive(Debug, Error)]
pub enum SinkError {
    /// A bounded buffer was created with capacity 0
    #[error("buffer capacity must be at least 1, got {capacity}")]
    InvalidCapacity { capacity: usize },

    /// Failed to write a result
    #[error("write failed: {0}")]
    Write(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Sink was closed
    #[error("sink '{0}' is closed")]
    Closed(String),
}

impl SinkError {
    /// Create an invalid capacity error
    pub fn invalid_capacity(capacity: usize) -> Self {
        Self::InvalidCapacity { capacity }
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
