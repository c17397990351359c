//! Protocol error types
//!
//! Errors raised while constructing protocol values.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Query pattern is empty
    #[error("query pattern must not be empty")]
    EmptyPattern,

    /// Query selects no attributes
    #[error("query '{pattern}' selects no attributes")]
    NoAttributes { pattern: String },

    /// Attribute name is empty
    #[error("query '{pattern}' contains an empty attribute name")]
    EmptyAttribute { pattern: String },
}

impl ProtocolError {
    /// Create a no attributes error
    #[inline]
    pub fn no_attributes(pattern: impl Into<String>) -> Self {
        Self::NoAttributes {
            pattern: pattern.into(),
        }
    }

    /// Create an empty attribute error
    #[inline]
    pub fn empty_attribute(pattern: impl Into<String>) -> Self {
        Self::EmptyAttribute {
            pattern: pattern.into(),
        }
    }
}
