//! Raw records to canonical panel.

use std::collections::{BTreeMap, HashMap, hash_map::Entry};

use jtmom_primitives::{
    Date, ExchangeCode, Panel, SecurityId, SecurityMonthRecord, columns,
    frame::{dates, floats},
    month_end, parse_date,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::PanelError;

/// How to resolve two raw rows for the same security and month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Keep the row that appears first in the input.
    #[default]
    KeepFirst,
    /// Keep the row that appears last in the input.
    KeepLast,
    /// Fail the run.
    Reject,
}

/// Configuration for the panel cleaner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Duplicate `(security_id, month)` resolution.
    pub duplicates: DuplicatePolicy,
}

/// A security-month row after type coercion but before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Security identifier.
    pub security_id: i64,
    /// Observation date, any day of the month.
    pub date: Date,
    /// Monthly return.
    pub ret: Option<f64>,
    /// Price; negative values are bid/ask midpoints.
    pub price: Option<f64>,
    /// Shares outstanding, in thousands.
    pub shares_outstanding: Option<f64>,
    /// Listing exchange.
    pub exchange_code: i64,
}

/// Builds the canonical panel from raw security-month data.
#[derive(Debug, Clone, Default)]
pub struct PanelCleaner {
    config: CleanConfig,
}

impl PanelCleaner {
    /// Create a cleaner with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleaner with a custom configuration.
    #[must_use]
    pub const fn with_config(config: CleanConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Clean a raw frame with columns `security_id | date | ret | price |
    /// shares_outstanding | exchange_code`.
    ///
    /// Identifiers and exchange codes may be integers, whole floats or
    /// numeric strings. Dates may be `Date`, `Datetime`, strings or
    /// `YYYYMMDD` integers.
    ///
    /// # Errors
    /// Returns `PanelError` if a column is missing, an identifier is null or
    /// non-numeric, a date cannot be read, or a duplicate is rejected.
    pub fn clean(&self, raw: &DataFrame) -> Result<Panel, PanelError> {
        for name in [
            columns::SECURITY_ID,
            columns::DATE,
            columns::RET,
            columns::PRICE,
            columns::SHARES,
            columns::EXCHANGE,
        ] {
            if raw.column(name).is_err() {
                return Err(PanelError::MissingColumn(name.to_string()));
            }
        }

        let ids = integral_column(raw, columns::SECURITY_ID)?;
        let exchanges = integral_column(raw, columns::EXCHANGE)?;
        let raw_dates = date_values(raw)?;
        let rets = floats(raw, columns::RET)?;
        let prices = floats(raw, columns::PRICE)?;
        let shares = floats(raw, columns::SHARES)?;

        let records = (0..raw.height())
            .map(|i| RawRecord {
                security_id: ids[i],
                date: raw_dates[i],
                ret: rets[i],
                price: prices[i],
                shares_outstanding: shares[i],
                exchange_code: exchanges[i],
            })
            .collect();

        self.clean_records(records)
    }

    /// Clean already-typed raw records.
    ///
    /// # Errors
    /// Returns `PanelError::DuplicateRecord` under [`DuplicatePolicy::Reject`].
    pub fn clean_records(&self, raw: Vec<RawRecord>) -> Result<Panel, PanelError> {
        let n_raw = raw.len();
        let mut kept: Vec<RawRecord> = Vec::with_capacity(n_raw);
        let mut seen: HashMap<(i64, Date), usize> = HashMap::with_capacity(n_raw);

        for mut record in raw {
            record.date = month_end(record.date);
            match seen.entry((record.security_id, record.date)) {
                Entry::Vacant(slot) => {
                    slot.insert(kept.len());
                    kept.push(record);
                }
                Entry::Occupied(slot) => match self.config.duplicates {
                    DuplicatePolicy::KeepFirst => {}
                    DuplicatePolicy::KeepLast => kept[*slot.get()] = record,
                    DuplicatePolicy::Reject => {
                        return Err(PanelError::DuplicateRecord {
                            security_id: record.security_id,
                            date: record.date,
                        });
                    }
                },
            }
        }

        let mut months: Vec<Date> = kept.iter().map(|r| r.date).collect();
        months.sort_unstable();
        months.dedup();
        let month_index: BTreeMap<Date, u32> =
            months.iter().zip(1u32..).map(|(d, i)| (*d, i)).collect();

        let mut invalid_returns = 0usize;
        let records: Vec<SecurityMonthRecord> = kept
            .into_iter()
            .map(|r| {
                let price = r.price.map(f64::abs);
                let ret = r.ret.filter(|x| *x >= -1.0);
                if r.ret.is_some() && ret.is_none() {
                    invalid_returns += 1;
                }
                SecurityMonthRecord {
                    security_id: SecurityId::new(r.security_id),
                    date: r.date,
                    ret,
                    price,
                    shares_outstanding: r.shares_outstanding,
                    exchange_code: ExchangeCode::new(r.exchange_code),
                    market_value: price.zip(r.shares_outstanding).map(|(p, s)| p * s / 1000.0),
                    month_index: month_index.get(&r.date).copied().unwrap_or_default(),
                }
            })
            .collect();

        info!(
            raw = n_raw,
            kept = records.len(),
            duplicates = n_raw - records.len(),
            invalid_returns,
            months = months.len(),
            "cleaned panel"
        );

        Ok(Panel::new(records))
    }
}

/// Read an identifier-like column as non-null integers.
fn integral_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, PanelError> {
    let column = df.column(name).map_err(|_| PanelError::MissingColumn(name.to_string()))?;
    let missing = |row| PanelError::MissingIdentifier { column: name.to_string(), row };
    let non_numeric =
        |row, value: String| PanelError::NonNumeric { column: name.to_string(), row, value };

    let dtype = column.dtype();
    if dtype.is_integer() {
        let cast = column.cast(&DataType::Int64)?;
        cast.i64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| missing(row)))
            .collect()
    } else if dtype.is_float() {
        let cast = column.cast(&DataType::Float64)?;
        cast.f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let v = v.ok_or_else(|| missing(row))?;
                whole_number(v).ok_or_else(|| non_numeric(row, v.to_string()))
            })
            .collect()
    } else if dtype == &DataType::String {
        column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let v = v.ok_or_else(|| missing(row))?;
                parse_integral(v).ok_or_else(|| non_numeric(row, v.to_string()))
            })
            .collect()
    } else {
        Err(non_numeric(0, format!("<{dtype}>")))
    }
}

fn date_values(df: &DataFrame) -> Result<Vec<Date>, PanelError> {
    let column = df.column(columns::DATE)?;
    let invalid = |row, value: String| PanelError::InvalidDate { row, value };

    if column.dtype() == &DataType::String {
        column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let v = v.ok_or_else(|| invalid(row, "null".to_string()))?;
                parse_date(v).ok_or_else(|| invalid(row, v.to_string()))
            })
            .collect()
    } else if column.dtype().is_integer() {
        let cast = column.cast(&DataType::Int64)?;
        cast.i64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                let v = v.ok_or_else(|| invalid(row, "null".to_string()))?;
                parse_date(&v.to_string()).ok_or_else(|| invalid(row, v.to_string()))
            })
            .collect()
    } else {
        dates(df, columns::DATE)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| invalid(row, "null".to_string())))
            .collect()
    }
}

fn whole_number(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0 && v.abs() < 9.007_199_254_740_992e15).then_some(v as i64)
}

fn parse_integral(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| raw.parse::<f64>().ok().and_then(whole_number))
}
