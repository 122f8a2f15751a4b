//! Data provider trait definitions.

use jtmom_primitives::PortfolioSeries;
use polars::prelude::*;

/// Errors that can occur while fetching external data.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] PolarsError),

    /// Missing required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// Source returned something that does not fit the schema.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Source of raw security-month records.
///
/// The returned frame carries `security_id | date | ret | price |
/// shares_outstanding | exchange_code`, already restricted to the provider's
/// universe. Types are not trusted; the panel cleaner coerces them.
pub trait PanelProvider {
    /// Fetch the raw panel.
    ///
    /// # Errors
    /// Returns `ProviderError` if the source cannot be read.
    fn fetch(&self) -> Result<DataFrame, ProviderError>;

    /// Human-readable source name.
    fn name(&self) -> &str;
}

/// Source of precomputed benchmark portfolio returns, used for validation only.
pub trait BenchmarkProvider {
    /// Fetch the benchmark series, one row per month-end with decimal returns.
    ///
    /// # Errors
    /// Returns `ProviderError` if the source cannot be read.
    fn fetch(&self) -> Result<PortfolioSeries, ProviderError>;

    /// Human-readable source name.
    fn name(&self) -> &str;
}

impl<P: PanelProvider + ?Sized> PanelProvider for &P {
    fn fetch(&self) -> Result<DataFrame, ProviderError> {
        (**self).fetch()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
