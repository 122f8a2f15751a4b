//! Error types for formation ranking.

/// Errors that can occur while ranking securities.
#[derive(Debug, thiserror::Error)]
pub enum FormationError {
    /// Math operation error.
    #[error("math error: {0}")]
    Math(#[from] jtmom_math::MathError),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FormationError::InvalidConfig("lookback must be positive".to_string());
        assert!(err.to_string().contains("lookback must be positive"));
    }
}
