//! Error types for mathematical operations.

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// A value that must be finite is not.
    #[error("non-finite value: {0}")]
    NonFinite(f64),

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Not enough observations.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// Distribution construction failed.
    #[error("distribution error: {0}")]
    Distribution(String),
}
