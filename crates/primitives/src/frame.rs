//! Column extraction and construction helpers for polars frames.
//!
//! The typed core works on plain records; these helpers are the boundary
//! where polars nulls become `None` and back.

use polars::prelude::*;

use crate::{Date, from_epoch_days, to_epoch_days};

/// Build a `Date` column from chrono dates.
///
/// # Errors
/// Returns `PolarsError` if the cast to `Date` fails.
pub fn date_column(name: &str, dates: &[Date]) -> PolarsResult<Column> {
    let days: Vec<i32> = dates.iter().map(|d| to_epoch_days(*d)).collect();
    Column::new(name.into(), days).cast(&DataType::Date)
}

/// Read a `Date` (or `Datetime`) column as chrono dates.
///
/// # Errors
/// Returns `PolarsError` if the column is missing or not temporal.
pub fn dates(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<Date>>> {
    let days = df.column(name)?.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    Ok(days.i32()?.into_iter().map(|d| d.and_then(from_epoch_days)).collect())
}

/// Read a numeric column as `f64`, mapping NaN and infinities to `None`.
///
/// # Errors
/// Returns `PolarsError` if the column is missing or cannot be cast.
pub fn floats(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let cast = df.column(name)?.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().map(|v| v.filter(|x| x.is_finite())).collect())
}

/// Read an integer column as `i64`.
///
/// # Errors
/// Returns `PolarsError` if the column is missing or cannot be cast.
pub fn integers(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let cast = df.column(name)?.cast(&DataType::Int64)?;
    Ok(cast.i64()?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_column_round_trip() {
        let input = vec![
            Date::from_ymd_opt(1965, 1, 31).unwrap(),
            Date::from_ymd_opt(2020, 2, 29).unwrap(),
        ];
        let df = DataFrame::new(vec![date_column("date", &input).unwrap()]).unwrap();
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let output: Vec<Date> = dates(&df, "date").unwrap().into_iter().flatten().collect();
        assert_eq!(output, input);
    }

    #[test]
    fn floats_drop_non_finite() {
        let df = df! {
            "x" => &[Some(1.0), None, Some(f64::NAN), Some(f64::INFINITY)],
        }
        .unwrap();

        assert_eq!(floats(&df, "x").unwrap(), vec![Some(1.0), None, None, None]);
    }

    #[test]
    fn integers_cast_from_i32() {
        let df = df! { "id" => &[1i32, 2, 3] }.unwrap();
        assert_eq!(integers(&df, "id").unwrap(), vec![Some(1), Some(2), Some(3)]);
    }
}
