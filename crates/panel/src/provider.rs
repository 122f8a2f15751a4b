//! File-backed and in-memory data providers.

use std::path::{Path, PathBuf};

use jtmom_primitives::{PortfolioRow, PortfolioSeries, columns, yyyymm_to_month_end};
use jtmom_traits::{BenchmarkProvider, PanelProvider, ProviderError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Columns a panel provider hands to the cleaner.
const PANEL_COLUMNS: [&str; 6] = [
    columns::SECURITY_ID,
    columns::DATE,
    columns::RET,
    columns::PRICE,
    columns::SHARES,
    columns::EXCHANGE,
];

/// Sentinel for missing observations in benchmark files.
const BENCHMARK_MISSING: f64 = -99.99;

/// Share-code and exchange-code ranges defining the stock universe.
///
/// The default keeps ordinary common shares (codes 10 and 11) on any
/// exchange code from -2 to 3, including halted and suspended listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseFilter {
    /// Lowest share code kept.
    pub min_share_code: i64,
    /// Highest share code kept.
    pub max_share_code: i64,
    /// Lowest exchange code kept.
    pub min_exchange_code: i64,
    /// Highest exchange code kept.
    pub max_exchange_code: i64,
}

impl Default for UniverseFilter {
    fn default() -> Self {
        Self { min_share_code: 10, max_share_code: 11, min_exchange_code: -2, max_exchange_code: 3 }
    }
}

impl UniverseFilter {
    /// Restrict a raw frame to the universe.
    ///
    /// The share-code condition is skipped when the frame has no
    /// `share_code` column.
    ///
    /// # Errors
    /// Returns `ProviderError::MissingColumn` without an exchange column.
    pub fn apply(&self, df: DataFrame) -> Result<DataFrame, ProviderError> {
        if df.column(columns::EXCHANGE).is_err() {
            return Err(ProviderError::MissingColumn(columns::EXCHANGE.to_string()));
        }

        let mut predicate = col(columns::EXCHANGE)
            .gt_eq(lit(self.min_exchange_code))
            .and(col(columns::EXCHANGE).lt_eq(lit(self.max_exchange_code)));
        if df.column(columns::SHARE_CODE).is_ok() {
            predicate = predicate.and(
                col(columns::SHARE_CODE)
                    .gt_eq(lit(self.min_share_code))
                    .and(col(columns::SHARE_CODE).lt_eq(lit(self.max_share_code))),
            );
        }

        let before = df.height();
        let filtered = df.lazy().filter(predicate).collect()?;
        debug!(before, after = filtered.height(), "applied universe filter");
        Ok(filtered)
    }
}

fn read_csv(path: &Path) -> Result<DataFrame, ProviderError> {
    if !path.exists() {
        return Err(ProviderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|o| o.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

fn select_panel_columns(df: &DataFrame) -> Result<DataFrame, ProviderError> {
    for name in PANEL_COLUMNS {
        if df.column(name).is_err() {
            return Err(ProviderError::MissingColumn(name.to_string()));
        }
    }
    Ok(df.select(PANEL_COLUMNS)?)
}

/// Monthly panel read from a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvPanelProvider {
    path: PathBuf,
    universe: Option<UniverseFilter>,
}

impl CsvPanelProvider {
    /// Read every row of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), universe: None }
    }

    /// Restrict rows to a universe.
    #[must_use]
    pub const fn with_universe(mut self, universe: UniverseFilter) -> Self {
        self.universe = Some(universe);
        self
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PanelProvider for CsvPanelProvider {
    fn fetch(&self) -> Result<DataFrame, ProviderError> {
        let mut df = read_csv(&self.path)?;
        debug!(path = %self.path.display(), rows = df.height(), "read panel csv");
        if let Some(universe) = &self.universe {
            df = universe.apply(df)?;
        }
        select_panel_columns(&df)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Panel already held in memory.
#[derive(Debug, Clone)]
pub struct FramePanelProvider {
    frame: DataFrame,
    universe: Option<UniverseFilter>,
}

impl FramePanelProvider {
    /// Wrap a raw frame.
    #[must_use]
    pub const fn new(frame: DataFrame) -> Self {
        Self { frame, universe: None }
    }

    /// Restrict rows to a universe.
    #[must_use]
    pub const fn with_universe(mut self, universe: UniverseFilter) -> Self {
        self.universe = Some(universe);
        self
    }
}

impl PanelProvider for FramePanelProvider {
    fn fetch(&self) -> Result<DataFrame, ProviderError> {
        let df = match &self.universe {
            Some(universe) => universe.apply(self.frame.clone())?,
            None => self.frame.clone(),
        };
        select_panel_columns(&df)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Decile portfolio benchmark read from CSV.
///
/// The first column holds `YYYYMM` months; each following column is one
/// portfolio, lowest prior return first, in percent. `-99.99` marks a
/// missing value.
#[derive(Debug, Clone)]
pub struct CsvBenchmarkProvider {
    path: PathBuf,
}

impl CsvBenchmarkProvider {
    /// Benchmark at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BenchmarkProvider for CsvBenchmarkProvider {
    fn fetch(&self) -> Result<PortfolioSeries, ProviderError> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(self.path.clone()))?
            .finish()?;
        benchmark_from_frame(&df)
    }

    fn name(&self) -> &str {
        "csv-benchmark"
    }
}

/// Convert a `YYYYMM | p1 | ... | pn` percent frame into a decimal series.
fn benchmark_from_frame(df: &DataFrame) -> Result<PortfolioSeries, ProviderError> {
    let columns = df.get_columns();
    let Some((month_col, portfolio_cols)) = columns.split_first() else {
        return Err(ProviderError::InvalidData("benchmark has no columns".to_string()));
    };
    if portfolio_cols.len() < 2 {
        return Err(ProviderError::InvalidData(format!(
            "benchmark needs at least two portfolios, found {}",
            portfolio_cols.len()
        )));
    }

    let months = month_col.cast(&DataType::Int64)?;
    let months: Vec<Option<i64>> = months.i64()?.into_iter().collect();

    let mut returns: Vec<Vec<Option<f64>>> = Vec::with_capacity(portfolio_cols.len());
    for column in portfolio_cols {
        let cast = column.cast(&DataType::Float64)?;
        returns.push(
            cast.f64()?
                .into_iter()
                .map(|v| {
                    v.filter(|x| x.is_finite() && (x - BENCHMARK_MISSING).abs() > 1e-9)
                        .map(|x| x / 100.0)
                })
                .collect(),
        );
    }

    let mut rows = Vec::with_capacity(months.len());
    for (i, month) in months.iter().enumerate() {
        let Some(raw) = month else { continue };
        let date = yyyymm_to_month_end(*raw)
            .ok_or_else(|| ProviderError::InvalidData(format!("invalid month {raw} at row {i}")))?;
        rows.push(PortfolioRow::new(date, returns.iter().map(|c| c[i]).collect()));
    }

    Ok(PortfolioSeries::new(portfolio_cols.len() as u32, rows))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use approx::assert_relative_eq;
    use jtmom_primitives::{Date, PortfolioColumn};

    use super::*;

    fn raw_frame() -> DataFrame {
        df! {
            "security_id" => &[1i64, 2, 3, 4],
            "date" => &["2000-01-31"; 4],
            "ret" => &[0.01, 0.02, 0.03, 0.04],
            "price" => &[1.0, 2.0, 3.0, 4.0],
            "shares_outstanding" => &[1.0, 1.0, 1.0, 1.0],
            "exchange_code" => &[1i64, 3, 4, 2],
            "share_code" => &[10i64, 11, 10, 12],
            "extra" => &["a", "b", "c", "d"],
        }
        .unwrap()
    }

    #[test]
    fn universe_filter_keeps_common_shares_on_known_exchanges() {
        let provider = FramePanelProvider::new(raw_frame()).with_universe(UniverseFilter::default());
        let df = provider.fetch().unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 6);
        let ids: Vec<Option<i64>> = df.column("security_id").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[test]
    fn frame_provider_without_universe_keeps_all() {
        let df = FramePanelProvider::new(raw_frame()).fetch().unwrap();
        assert_eq!(df.height(), 4);
        assert!(df.column("extra").is_err());
    }

    #[test]
    fn missing_panel_column() {
        let provider = FramePanelProvider::new(df! { "security_id" => &[1i64] }.unwrap());
        assert!(matches!(provider.fetch(), Err(ProviderError::MissingColumn(_))));
    }

    #[test]
    fn csv_provider_missing_file() {
        let provider = CsvPanelProvider::new("/nonexistent/panel.csv");
        assert!(matches!(provider.fetch(), Err(ProviderError::Io(_))));
    }

    #[test]
    fn csv_panel_round_trip() {
        let path = std::env::temp_dir().join(format!("jtmom-panel-{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "security_id,date,ret,price,shares_outstanding,exchange_code,share_code").unwrap();
        writeln!(file, "10001,1990-01-31,0.05,-10.0,2000,1,10").unwrap();
        writeln!(file, "10002,1990-01-31,,20.0,500,3,73").unwrap();
        drop(file);

        let df = CsvPanelProvider::new(&path).with_universe(UniverseFilter::default()).fetch().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 6);
    }

    #[test]
    fn benchmark_frame_to_decimal_series() {
        let df = df! {
            "month" => &[192701i64, 192702],
            "lo" => &[1.0, -99.99],
            "mid" => &[2.0, 3.0],
            "hi" => &[5.0, 4.0],
        }
        .unwrap();

        let series = benchmark_from_frame(&df).unwrap();
        assert_eq!(series.n_portfolios(), 3);
        assert_eq!(series.dates(), vec![
            Date::from_ymd_opt(1927, 1, 31).unwrap(),
            Date::from_ymd_opt(1927, 2, 28).unwrap(),
        ]);

        let mom = series.column(PortfolioColumn::Mom);
        assert_relative_eq!(mom[0].unwrap(), 0.04, epsilon = 1e-12);
        assert_eq!(mom[1], None);
        assert_relative_eq!(series.column(PortfolioColumn::Rank(2))[1].unwrap(), 0.03);
    }

    #[test]
    fn benchmark_needs_two_portfolios() {
        let df = df! { "month" => &[192701i64], "only" => &[1.0] }.unwrap();
        assert!(matches!(benchmark_from_frame(&df), Err(ProviderError::InvalidData(_))));
    }
}
