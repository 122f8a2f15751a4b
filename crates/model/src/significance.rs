//! Mean returns and Newey-West significance per portfolio column.

use std::fmt;

use jtmom_math::{MathError, newey_west_mean_test};
use jtmom_primitives::{PortfolioColumn, PortfolioSeries};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Test result for one column of the portfolio series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Column tested.
    pub column: PortfolioColumn,
    /// Display label, e.g. `1 (loser)`.
    pub label: String,
    /// Mean monthly return; NaN without observations.
    pub mean: f64,
    /// Newey-West t-statistic; NaN with fewer than two observations.
    pub t_stat: f64,
    /// Two-sided p-value; NaN with fewer than two observations.
    pub p_value: f64,
    /// Months with a return.
    pub n_obs: usize,
}

/// Mean and HAC t-test of every rank and the `mom` spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    rows: Vec<SummaryRow>,
    lags: usize,
}

fn label(column: PortfolioColumn, n_portfolios: u32) -> String {
    match column {
        PortfolioColumn::Rank(1) => "1 (loser)".to_string(),
        PortfolioColumn::Rank(r) if r == n_portfolios => format!("{r} (winner)"),
        PortfolioColumn::Rank(r) => r.to_string(),
        PortfolioColumn::Mom => "mom (winner-loser)".to_string(),
    }
}

impl PortfolioSummary {
    /// Test every column of `series` with `lags` Newey-West lags.
    ///
    /// Missing months are dropped per column.
    ///
    /// # Errors
    /// Returns `ModelError::Math` if the t distribution cannot be built.
    pub fn from_series(series: &PortfolioSeries, lags: usize) -> Result<Self, ModelError> {
        let n = series.n_portfolios();
        let mut rows = Vec::with_capacity(n as usize + 1);

        for column in series.columns() {
            let values: Vec<f64> = series.column(column).into_iter().flatten().collect();
            let mean = if values.is_empty() {
                f64::NAN
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            let (t_stat, p_value) = match newey_west_mean_test(&values, lags) {
                Ok(test) => (test.t_stat, test.p_value),
                Err(MathError::InsufficientData { .. }) => (f64::NAN, f64::NAN),
                Err(e) => return Err(e.into()),
            };
            rows.push(SummaryRow {
                column,
                label: label(column, n),
                mean,
                t_stat,
                p_value,
                n_obs: values.len(),
            });
        }

        Ok(Self { rows, lags })
    }

    /// One row per rank, then `mom`.
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Row for one column.
    #[must_use]
    pub fn get(&self, column: PortfolioColumn) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.column == column)
    }

    /// Newey-West lag truncation used.
    #[must_use]
    pub const fn lags(&self) -> usize {
        self.lags
    }
}

/// Markdown table: `port | ret | t | p`, rounded to 4, 2 and 3 decimals.
impl fmt::Display for PortfolioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.rows.iter().map(|r| r.label.len()).max().unwrap_or(4).max(4);
        writeln!(f, "| {:<width$} | {:>8} | {:>6} | {:>6} |", "port", "ret", "t", "p")?;
        writeln!(f, "|:{}|{}:|{}:|{}:|", "-".repeat(width + 1), "-".repeat(9), "-".repeat(7), "-".repeat(7))?;
        for (i, r) in self.rows.iter().enumerate() {
            write!(
                f,
                "| {:<width$} | {:>8.4} | {:>6.2} | {:>6.3} |",
                r.label, r.mean, r.t_stat, r.p_value
            )?;
            if i + 1 < self.rows.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use jtmom_primitives::{Date, PortfolioRow, month_end};

    use super::*;

    fn series() -> PortfolioSeries {
        let d = |m| month_end(Date::from_ymd_opt(2012, m, 1).unwrap());
        PortfolioSeries::new(
            3,
            vec![
                PortfolioRow::new(d(1), vec![Some(0.0), Some(0.0), Some(1.0)]),
                PortfolioRow::new(d(2), vec![Some(0.0), None, Some(2.0)]),
                PortfolioRow::new(d(3), vec![Some(0.0), None, Some(3.0)]),
                PortfolioRow::new(d(4), vec![Some(0.0), None, Some(4.0)]),
            ],
        )
    }

    #[test]
    fn summary_uses_newey_west() {
        let summary = PortfolioSummary::from_series(&series(), 1).unwrap();
        assert_eq!(summary.rows().len(), 4);

        let mom = summary.get(PortfolioColumn::Mom).unwrap();
        assert_eq!(mom.label, "mom (winner-loser)");
        assert_eq!(mom.n_obs, 4);
        assert_relative_eq!(mom.mean, 2.5);
        assert_relative_eq!(mom.t_stat, 4.0, epsilon = 1e-12);
        assert_relative_eq!(mom.p_value, 0.028_008_456_010_145_9, epsilon = 1e-9);

        let winner = summary.get(PortfolioColumn::Rank(3)).unwrap();
        assert_eq!(winner.label, "3 (winner)");
        assert_relative_eq!(winner.t_stat, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn sparse_columns_are_nan() {
        let summary = PortfolioSummary::from_series(&series(), 3).unwrap();
        let middle = summary.get(PortfolioColumn::Rank(2)).unwrap();
        assert_eq!(middle.label, "2");
        assert_eq!(middle.n_obs, 1);
        assert_relative_eq!(middle.mean, 0.0);
        assert!(middle.t_stat.is_nan());
    }

    #[test]
    fn markdown_table() {
        let text = PortfolioSummary::from_series(&series(), 1).unwrap().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("| port"));
        assert!(lines[5].contains("mom (winner-loser)"));
        assert!(lines[5].contains("2.5000"));
        assert!(lines[5].contains("4.00"));
        assert!(lines[5].contains("0.028"));
    }
}
