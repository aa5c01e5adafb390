//! Domain error types
//!
//! This module defines the error hierarchy for the metrics pipeline.
//! Configuration mistakes and caller bugs are fatal; store failures are
//! represented here but are absorbed by the loaders, which degrade to empty
//! tables instead of propagating them.

use thiserror::Error;

/// Main pipeline error type
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
pub enum EmsError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A metric name was requested that is not in the registry
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Record store errors
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    /// Hospital reference data could not be loaded
    #[error("Reference data error: {0}")]
    Reference(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl EmsError {
    /// Returns true for errors caused by an unreachable or failing record store
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            EmsError::Store(StoreError::ConnectionFailed(_) | StoreError::Timeout(_))
        )
    }
}

/// Record store errors
///
/// These errors don't expose driver types; adapters translate driver
/// failures into one of these variants.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to record store: {0}")]
    ConnectionFailed(String),

    /// A find operation failed
    #[error("Query failed on collection '{collection}': {message}")]
    QueryFailed { collection: String, message: String },

    /// A returned document could not be decoded
    #[error("Invalid document in collection '{collection}': {message}")]
    InvalidDocument { collection: String, message: String },

    /// Operation timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Failed to release the connection
    #[error("Failed to close record store: {0}")]
    CloseFailed(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for EmsError {
    fn from(err: std::io::Error) -> Self {
        EmsError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for EmsError {
    fn from(err: serde_json::Error) -> Self {
        EmsError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for EmsError {
    fn from(err: toml::de::Error) -> Self {
        EmsError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv errors (hospital reference table)
impl From<csv::Error> for EmsError {
    fn from(err: csv::Error) -> Self {
        EmsError::Reference(format!("CSV error: {err}"))
    }
}
