//! Error types for the session_forecast crate

use thiserror::Error;

/// Custom error types for the session_forecast crate
///
/// Only programmer errors surface here. Recoverable statistical conditions
/// (insufficient warm-up, empty validation windows, exhausted neighbor gates)
/// are reported as reason flags on the prediction itself, never as errors.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Error related to data validation or ordering
    #[error("Data error: {0}")]
    DataError(String),

    /// Arrays that must be aligned with the bar sequence have different lengths
    #[error("Length mismatch: {0}")]
    LengthMismatch(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, SignalError>;
