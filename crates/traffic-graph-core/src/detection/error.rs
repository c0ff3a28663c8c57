//! Error types for the finder pipeline.

use thiserror::Error;

use crate::error::CoreError;
use crate::types::EndpointId;

/// Failure modes of the detection pipeline.
///
/// `DegenerateCurve` (no knee in the density profile) and an invalid
/// epsilon override are deliberately absent: both are recovered locally
/// (median fallback, keep-recommendation) and surfaced only as warnings.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The selected batch is empty. Terminal, reported, never retried.
    #[error("No endpoint data available for the selected batch")]
    DataUnavailable,

    /// The batch is smaller than the minimum neighborhood size;
    /// density clustering is undefined below this size.
    #[error("Insufficient data: clustering requires at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum number of points the pipeline needs.
        required: usize,
        /// Number of points actually fetched.
        actual: usize,
    },

    /// A record's embedding length differs from the rest of the batch.
    /// Hard input invariant; always fatal.
    #[error(
        "Embedding dimension mismatch: expected {expected}, got {actual} for {identity}"
    )]
    DimensionMismatch {
        /// Dimension established by the first record in the batch.
        expected: usize,
        /// Dimension of the offending record.
        actual: usize,
        /// Identity of the offending record.
        identity: EndpointId,
    },

    /// A pipeline parameter failed validation.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Store read or write failure. Fatal: the run aborts with no
    /// partial persistence.
    #[error(transparent)]
    Store(#[from] CoreError),
}

/// Result type alias for detection operations.
pub type DetectionResult<T> = Result<T, DetectionError>;
