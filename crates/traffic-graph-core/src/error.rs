//! Error types for traffic-graph-core.
//!
//! Defines the central [`CoreError`] type used throughout the core crate
//! along with the [`CoreResult<T>`] alias. Stage-specific detection errors
//! live in [`crate::detection::DetectionError`] and wrap `CoreError` where
//! they cross the store boundary.

use thiserror::Error;

use crate::types::EndpointId;

/// Top-level error type for core operations.
///
/// # Examples
///
/// ```
/// use traffic_graph_core::error::CoreError;
///
/// let err = CoreError::ValidationError {
///     field: "embedding".to_string(),
///     message: "must not be empty".to_string(),
/// };
/// assert!(err.to_string().contains("embedding"));
/// ```
#[derive(Debug, Error)]
pub enum CoreError {
    /// A field value failed validation constraints.
    ///
    /// Raised before any value enters the store or the pipeline:
    /// invalid records are never stored and never clustered.
    #[error("Validation error: {field} - {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// An error occurred during storage operations.
    ///
    /// Covers connection failure, read/write failure, and anything else
    /// the backing store reports. Always fatal to the run; there is no
    /// silent partial persistence.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Error during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A requested endpoint was not found in the store.
    #[error("Endpoint not found: {identity}")]
    NotFound {
        /// The identity that was not found
        identity: EndpointId,
    },
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::ConfigError(err.to_string())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
