//! Source error types

use thiserror::Error;

/// Errors that fail a whole query
///
/// Failures of single entities are not errors; they are reported in the
/// `QueryOutcome` next to the samples that could be read.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Pattern could not be compiled
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// The source cannot answer queries right now
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Create an InvalidPattern error
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;
