//! Unified error handling for the query engine.
//!
//! The taxonomy is deliberately small: every failure in the pipeline is one
//! of four fatal kinds, surfaced synchronously at the point it is detected.
//! There is no retry layer anywhere; a provider fault propagates verbatim.

use thiserror::Error;

/// Engine error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Bad or missing entity metadata: unknown field, invalid storage
    /// reference, patch marker pointing at a non-lookup field.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The live list version differs from the one recorded in the entity
    /// metadata. Raised before any row fetch.
    #[error("version mismatch for list '{list}': expected {expected}, found {actual}")]
    VersionMismatch {
        list: String,
        expected: String,
        actual: String,
    },

    /// Fault reported by the remote tabular provider, propagated verbatim.
    #[error("provider fault: {0}")]
    Provider(String),

    /// Malformed row data: unparseable raw value, more than one unrecognized
    /// choice token, leftover token with no companion property.
    #[error("shape error: {0}")]
    Shape(String),
}

/// Unified result type.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        EngineError::Configuration(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        EngineError::Provider(msg.into())
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        EngineError::Shape(msg.into())
    }
}
