//! CSV export of portfolio series.

use std::{fs::File, path::Path};

use jtmom_primitives::PortfolioSeries;
use polars::prelude::*;
use tracing::info;

use crate::ModelError;

/// Write the wide series frame (`date | 1 | ... | n | mom`) to `path`.
///
/// # Errors
/// Returns `ModelError` if the file cannot be created or written.
pub fn write_series_csv(series: &PortfolioSeries, path: &Path) -> Result<(), ModelError> {
    let mut df = series.to_frame()?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    info!(path = %path.display(), rows = df.height(), "wrote portfolio series");
    Ok(())
}
