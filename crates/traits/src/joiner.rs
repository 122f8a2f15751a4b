//! Holding-period join trait definitions.

use jtmom_primitives::{FormationSet, HoldingSet, Panel};
use polars::prelude::*;

/// Errors that can occur during the holding-period join.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] PolarsError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Query output did not match the expected schema.
    #[error("unexpected join output: {0}")]
    Schema(String),
}

/// Interval join between formation windows and realized panel returns.
///
/// For every formation record, attach every panel record of the same
/// security whose date lies in `[hold_start, hold_end]`. Implementations
/// differ only in execution strategy; for a fixed input they must return
/// identical holding sets.
pub trait HoldingJoiner {
    /// Join formations against the panel.
    ///
    /// # Errors
    /// Returns `JoinError` if execution fails.
    fn join(&self, formations: &FormationSet, panel: &Panel) -> Result<HoldingSet, JoinError>;

    /// Returns the name of this strategy.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_error_display() {
        let err = JoinError::InvalidConfig("chunk size must be positive".to_string());
        assert_eq!(err.to_string(), "invalid configuration: chunk size must be positive");
    }
}
