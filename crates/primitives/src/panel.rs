//! Canonical security-month panel.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Date, ExchangeCode, SecurityId, columns, frame::date_column};

/// One security in one calendar month, after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityMonthRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Month-end date.
    pub date: Date,
    /// Monthly return; `None` when missing or implausible.
    pub ret: Option<f64>,
    /// Absolute price.
    pub price: Option<f64>,
    /// Shares outstanding, in thousands.
    pub shares_outstanding: Option<f64>,
    /// Listing exchange.
    pub exchange_code: ExchangeCode,
    /// Market value in millions: `price * shares_outstanding / 1000`.
    pub market_value: Option<f64>,
    /// Dense calendar-month index, 1-based, shared by all securities in a month.
    pub month_index: u32,
}

/// The canonical panel, ordered by `(security_id, date)`.
///
/// Uniqueness of `(security_id, date)` and the dense month index are
/// established by the panel cleaner; this type only keeps the ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    records: Vec<SecurityMonthRecord>,
}

impl Panel {
    /// Create a panel, sorting records by `(security_id, date)`.
    #[must_use]
    pub fn new(mut records: Vec<SecurityMonthRecord>) -> Self {
        records.sort_by(|a, b| (a.security_id, a.date).cmp(&(b.security_id, b.date)));
        Self { records }
    }

    /// All records.
    #[must_use]
    pub fn records(&self) -> &[SecurityMonthRecord] {
        &self.records
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

    /// Iterate over each security's records as a date-ordered slice.
    pub fn by_security(&self) -> impl Iterator<Item = &[SecurityMonthRecord]> {
        self.records.chunk_by(|a, b| a.security_id == b.security_id)
    }

    /// Number of distinct securities.
    #[must_use]
    pub fn n_securities(&self) -> usize {
        self.by_security().count()
    }

    /// Distinct month-end dates, ascending.
    #[must_use]
    pub fn months(&self) -> Vec<Date> {
        let mut months: Vec<Date> = self.records.iter().map(|r| r.date).collect();
        months.sort_unstable();
        months.dedup();
        months
    }

    /// Full panel as a frame.
    ///
    /// # Errors
    /// Returns `PolarsError` if frame construction fails.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let rs = &self.records;
        let dates: Vec<Date> = rs.iter().map(|r| r.date).collect();
        DataFrame::new(vec![
            Column::new(
                columns::SECURITY_ID.into(),
                rs.iter().map(|r| r.security_id.get()).collect::<Vec<_>>(),
            ),
            date_column(columns::DATE, &dates)?,
            Column::new(columns::RET.into(), rs.iter().map(|r| r.ret).collect::<Vec<_>>()),
            Column::new(columns::PRICE.into(), rs.iter().map(|r| r.price).collect::<Vec<_>>()),
            Column::new(
                columns::SHARES.into(),
                rs.iter().map(|r| r.shares_outstanding).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::EXCHANGE.into(),
                rs.iter().map(|r| r.exchange_code.get()).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::MARKET_VALUE.into(),
                rs.iter().map(|r| r.market_value).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::MONTH_INDEX.into(),
                rs.iter().map(|r| r.month_index).collect::<Vec<_>>(),
            ),
        ])
    }

    /// Rows `[offset, offset + len)` as a `security_id | date | ret` frame.
    ///
    /// # Errors
    /// Returns `PolarsError` if frame construction fails.
    pub fn returns_frame(&self, offset: usize, len: usize) -> PolarsResult<DataFrame> {
        let end = offset.saturating_add(len).min(self.records.len());
        let rs = &self.records[offset.min(end)..end];
        let dates: Vec<Date> = rs.iter().map(|r| r.date).collect();
        DataFrame::new(vec![
            Column::new(
                columns::SECURITY_ID.into(),
                rs.iter().map(|r| r.security_id.get()).collect::<Vec<_>>(),
            ),
            date_column(columns::DATE, &dates)?,
            Column::new(columns::RET.into(), rs.iter().map(|r| r.ret).collect::<Vec<_>>()),
        ])
    }
}
