//! Holding-period return observations.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Date, SecurityId, columns, frame::date_column};

/// A security's realized return in one month of one formation cohort's holding window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Formation month of the cohort.
    pub formation_date: Date,
    /// Portfolio rank assigned at formation.
    pub rank: u32,
    /// Realized month-end.
    pub date: Date,
    /// Realized return.
    pub ret: Option<f64>,
    /// Formation weight carried from the cohort.
    pub weight: Option<f64>,
    /// `ret * weight`.
    pub weighted_return: Option<f64>,
}

/// Expanded panel produced by the holding-period join.
///
/// Ordered by `(date, formation_date, rank, security_id)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingSet {
    records: Vec<HoldingRecord>,
    n_portfolios: u32,
}

impl HoldingSet {
    /// Create a holding set, sorting into canonical order.
    #[must_use]
    pub fn new(mut records: Vec<HoldingRecord>, n_portfolios: u32) -> Self {
        records.sort_by(|a, b| {
            (a.date, a.formation_date, a.rank, a.security_id)
                .cmp(&(b.date, b.formation_date, b.rank, b.security_id))
        });
        Self { records, n_portfolios }
    }

    /// All records.
    #[must_use]
    pub fn records(&self) -> &[HoldingRecord] {
        &self.records
    }

    /// Configured number of portfolios.
    #[must_use]
    pub const fn n_portfolios(&self) -> u32 {
        self.n_portfolios
    }

    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Frame with one row per record.
    ///
    /// # Errors
    /// Returns `PolarsError` if frame construction fails.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let rs = &self.records;
        let form: Vec<Date> = rs.iter().map(|r| r.formation_date).collect();
        let dates: Vec<Date> = rs.iter().map(|r| r.date).collect();
        DataFrame::new(vec![
            Column::new(
                columns::SECURITY_ID.into(),
                rs.iter().map(|r| r.security_id.get()).collect::<Vec<_>>(),
            ),
            date_column(columns::FORMATION_DATE, &form)?,
            Column::new(columns::RANK.into(), rs.iter().map(|r| r.rank).collect::<Vec<_>>()),
            date_column(columns::DATE, &dates)?,
            Column::new(columns::RET.into(), rs.iter().map(|r| r.ret).collect::<Vec<_>>()),
            Column::new(columns::WEIGHT.into(), rs.iter().map(|r| r.weight).collect::<Vec<_>>()),
            Column::new(
                columns::WEIGHTED_RETURN.into(),
                rs.iter().map(|r| r.weighted_return).collect::<Vec<_>>(),
            ),
        ])
    }
}
