//! Error types for the momentum study.

use jtmom_formation::FormationError;
use jtmom_math::MathError;
use jtmom_panel::PanelError;
use jtmom_traits::{JoinError, ProviderError};

/// Errors that can occur while running a study.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Panel cleaning error.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Formation ranking error.
    #[error("formation error: {0}")]
    Formation(#[from] FormationError),

    /// Holding join error.
    #[error("join error: {0}")]
    Join(#[from] JoinError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run produced no portfolio returns.
    #[error("no portfolio returns in sample period")]
    EmptySeries,
}
