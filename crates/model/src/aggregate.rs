//! Portfolio return aggregation.

use std::fmt;

use jtmom_primitives::{
    Date, HoldingSet, PortfolioRow, PortfolioSeries,
    columns::{DATE, FORMATION_DATE, RANK, RET, WEIGHTED_RETURN},
    frame::{dates, floats, integers},
    to_epoch_days,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ModelError;

const COHORT: &str = "cohort";

/// How returns are combined within a formation cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weighting {
    /// Simple average of member returns.
    #[default]
    Equal,
    /// Market-value weighted at formation.
    Value,
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => f.write_str("ew"),
            Self::Value => f.write_str("vw"),
        }
    }
}

/// Collapses holding records into one return per calendar month and rank.
///
/// Each `(month, rank, formation_date)` cohort is reduced first (mean of
/// returns, or sum of weighted returns), then cohorts active in the month
/// are averaged. Cohorts with no usable return are missing, not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortfolioAggregator {
    weighting: Weighting,
    start: Option<Date>,
    end: Option<Date>,
}

impl PortfolioAggregator {
    /// Aggregate over the whole sample.
    #[must_use]
    pub const fn new(weighting: Weighting) -> Self {
        Self { weighting, start: None, end: None }
    }

    /// Restrict realized months to `[start, end]`; either bound may be open.
    #[must_use]
    pub const fn with_period(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Weighting scheme.
    #[must_use]
    pub const fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Build the portfolio series.
    ///
    /// Columns run from 1 to the highest rank present in the period.
    ///
    /// # Errors
    /// Returns `ModelError::Polars` if a frame operation fails.
    pub fn aggregate(&self, holdings: &HoldingSet) -> Result<PortfolioSeries, ModelError> {
        let mut lf = holdings.to_frame()?.lazy();
        if let Some(start) = self.start {
            lf = lf.filter(col(DATE).gt_eq(lit(to_epoch_days(start)).cast(DataType::Date)));
        }
        if let Some(end) = self.end {
            lf = lf.filter(col(DATE).lt_eq(lit(to_epoch_days(end)).cast(DataType::Date)));
        }

        // Polars sums an all-null group to zero; an empty cohort stays missing.
        let cohort = match self.weighting {
            Weighting::Equal => col(RET).mean(),
            Weighting::Value => when(col(WEIGHTED_RETURN).count().gt(lit(0)))
                .then(col(WEIGHTED_RETURN).sum())
                .otherwise(lit(NULL).cast(DataType::Float64)),
        };

        let cells = lf
            .group_by([col(DATE), col(RANK), col(FORMATION_DATE)])
            .agg([cohort.alias(COHORT)])
            .group_by([col(DATE), col(RANK)])
            .agg([col(COHORT).mean()])
            .sort([DATE, RANK], SortMultipleOptions::default())
            .collect()?;

        let row_dates = dates(&cells, DATE)?;
        let ranks = integers(&cells, RANK)?;
        let values = floats(&cells, COHORT)?;

        let n = ranks.iter().flatten().copied().max().unwrap_or(0);
        let n = u32::try_from(n).unwrap_or(0);
        let mut rows: Vec<PortfolioRow> = Vec::new();
        let mut current: Option<(Date, Vec<Option<f64>>)> = None;
        for ((date, rank), value) in row_dates.into_iter().zip(ranks).zip(values) {
            let (Some(date), Some(rank)) = (date, rank) else {
                continue;
            };
            if current.as_ref().is_none_or(|(d, _)| *d != date) {
                if let Some((d, returns)) = current.take() {
                    rows.push(PortfolioRow::new(d, returns));
                }
                current = Some((date, vec![None; n as usize]));
            }
            if let Some((_, returns)) = current.as_mut()
                && let Some(slot) = usize::try_from(rank - 1).ok().and_then(|i| returns.get_mut(i))
            {
                *slot = value;
            }
        }
        if let Some((d, returns)) = current {
            rows.push(PortfolioRow::new(d, returns));
        }

        let series = PortfolioSeries::new(n, rows);
        if let Some((first, last)) = series.sample_period() {
            info!(weighting = %self.weighting, months = series.len(), %first, %last, "sample period");
        }
        Ok(series)
    }
}
