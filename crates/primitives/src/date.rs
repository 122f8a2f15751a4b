//! Calendar-month arithmetic.
//!
//! Every date in the engine is a month-end. These helpers normalize raw dates
//! and move along the month-end grid without reaching for a full calendar.

use chrono::{Datelike, Months};

/// Re-export common date type.
pub type Date = chrono::NaiveDate;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01, the polars date epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Last calendar day of the month containing `date`.
#[must_use]
pub fn month_end(date: Date) -> Date {
    let first = date.with_day(1).unwrap_or(date);
    first.checked_add_months(Months::new(1)).and_then(|d| d.pred_opt()).unwrap_or(date)
}

/// First calendar day of the month after the one containing `date`.
#[must_use]
pub fn next_month_begin(date: Date) -> Date {
    let end = month_end(date);
    end.succ_opt().unwrap_or(end)
}

/// Month-end `months` months after the month containing `date`.
///
/// `shift_month_end(2020-01-31, 6)` is `2020-07-31`; a shift of zero
/// normalizes to the current month-end.
#[must_use]
pub fn shift_month_end(date: Date, months: u32) -> Date {
    let first = date.with_day(1).unwrap_or(date);
    first.checked_add_months(Months::new(months)).map_or_else(|| month_end(date), month_end)
}

/// Convert a date to days since 1970-01-01 (polars `Date` physical type).
#[must_use]
pub fn to_epoch_days(date: Date) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

/// Convert days since 1970-01-01 back to a date.
#[must_use]
pub fn from_epoch_days(days: i32) -> Option<Date> {
    days.checked_add(EPOCH_DAYS_FROM_CE).and_then(Date::from_num_days_from_ce_opt)
}

/// Interpret an integer such as `202203` as the month-end of that month.
#[must_use]
pub fn yyyymm_to_month_end(value: i64) -> Option<Date> {
    let year = i32::try_from(value / 100).ok()?;
    let month = u32::try_from(value % 100).ok()?;
    Date::from_ymd_opt(year, month, 1).map(month_end)
}

/// Parse `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYYMMDD`.
#[must_use]
pub fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| Date::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case(d(2020, 2, 3), d(2020, 2, 29))]
    #[case(d(2021, 2, 28), d(2021, 2, 28))]
    #[case(d(2021, 12, 1), d(2021, 12, 31))]
    #[case(d(1999, 4, 30), d(1999, 4, 30))]
    fn month_end_normalizes(#[case] input: Date, #[case] expected: Date) {
        assert_eq!(month_end(input), expected);
    }

    #[test]
    fn holding_window_bounds() {
        let formation = d(2020, 1, 31);
        assert_eq!(next_month_begin(formation), d(2020, 2, 1));
        assert_eq!(shift_month_end(formation, 6), d(2020, 7, 31));
        assert_eq!(shift_month_end(d(2020, 8, 31), 6), d(2021, 2, 28));
        assert_eq!(shift_month_end(d(2020, 12, 31), 1), d(2021, 1, 31));
    }

    #[test]
    fn epoch_days_round_trip() {
        assert_eq!(to_epoch_days(d(1970, 1, 1)), 0);
        assert_eq!(to_epoch_days(d(1970, 1, 31)), 30);
        assert_eq!(from_epoch_days(-1), Some(d(1969, 12, 31)));
    }

    #[test]
    fn yyyymm_and_parse() {
        assert_eq!(yyyymm_to_month_end(192607), Some(d(1926, 7, 31)));
        assert_eq!(yyyymm_to_month_end(202213), None);
        assert_eq!(parse_date("1986-10-31"), Some(d(1986, 10, 31)));
        assert_eq!(parse_date("19861031"), Some(d(1986, 10, 31)));
        assert_eq!(parse_date("not a date"), None);
    }
}
