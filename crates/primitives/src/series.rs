//! Portfolio return time series.

use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Date, columns, frame::date_column};

/// A column of the portfolio series: a rank or the long-short spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortfolioColumn {
    /// Portfolio of the given rank.
    Rank(u32),
    /// Top rank minus bottom rank.
    Mom,
}

impl fmt::Display for PortfolioColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rank(r) => write!(f, "{r}"),
            Self::Mom => write!(f, "{}", columns::MOM),
        }
    }
}

/// Returns of every rank in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRow {
    /// Calendar month-end.
    pub date: Date,
    /// Aggregate return per rank; index 0 is rank 1.
    pub returns: Vec<Option<f64>>,
    /// Top-rank return minus bottom-rank return.
    pub mom: Option<f64>,
}

impl PortfolioRow {
    /// Create a row, deriving the long-short spread from the extreme ranks.
    ///
    /// With a single rank column the top and bottom ranks coincide and the
    /// spread is zero.
    #[must_use]
    pub fn new(date: Date, returns: Vec<Option<f64>>) -> Self {
        let mom = match (returns.first().copied().flatten(), returns.last().copied().flatten()) {
            (Some(low), Some(high)) => Some(high - low),
            _ => None,
        };
        Self { date, returns, mom }
    }

    /// Value of one column.
    #[must_use]
    pub fn get(&self, column: PortfolioColumn) -> Option<f64> {
        match column {
            PortfolioColumn::Rank(r) => {
                r.checked_sub(1).and_then(|i| self.returns.get(i as usize).copied().flatten())
            }
            PortfolioColumn::Mom => self.mom,
        }
    }
}

/// One row per calendar month, one column per rank plus `mom`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSeries {
    n_portfolios: u32,
    rows: Vec<PortfolioRow>,
}

impl PortfolioSeries {
    /// Create a series ordered by date.
    #[must_use]
    pub fn new(n_portfolios: u32, mut rows: Vec<PortfolioRow>) -> Self {
        rows.sort_by_key(|r| r.date);
        Self { n_portfolios, rows }
    }

    /// Number of rank columns.
    #[must_use]
    pub const fn n_portfolios(&self) -> u32 {
        self.n_portfolios
    }

    /// Monthly rows.
    #[must_use]
    pub fn rows(&self) -> &[PortfolioRow] {
        &self.rows
    }

    /// Number of months.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rank columns followed by `mom`.
    #[must_use]
    pub fn columns(&self) -> Vec<PortfolioColumn> {
        (1..=self.n_portfolios)
            .map(PortfolioColumn::Rank)
            .chain(std::iter::once(PortfolioColumn::Mom))
            .collect()
    }

    /// Values of one column in date order.
    #[must_use]
    pub fn column(&self, column: PortfolioColumn) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(column)).collect()
    }

    /// Month-end dates in order.
    #[must_use]
    pub fn dates(&self) -> Vec<Date> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// First and last month of the series.
    #[must_use]
    pub fn sample_period(&self) -> Option<(Date, Date)> {
        Some((self.rows.first()?.date, self.rows.last()?.date))
    }

    /// Long format: `(date, rank, return)` for every cell.
    pub fn observations(&self) -> impl Iterator<Item = (Date, u32, Option<f64>)> + '_ {
        self.rows.iter().flat_map(|row| {
            row.returns.iter().enumerate().map(move |(i, r)| (row.date, i as u32 + 1, *r))
        })
    }

    /// Wide frame: `date | 1 | ... | n | mom`.
    ///
    /// # Errors
    /// Returns `PolarsError` if frame construction fails.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut cols = vec![date_column(columns::DATE, &self.dates())?];
        for column in self.columns() {
            cols.push(Column::new(column.to_string().into(), self.column(column)));
        }
        DataFrame::new(cols)
    }
}
