//! Data-quality report over the canonical panel.

use std::{collections::BTreeSet, fmt};

use jtmom_primitives::{Date, Panel, SecurityId};
use tracing::info;

/// Per-record quality markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCheck {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Month-end date.
    pub date: Date,
    /// Dense months since the security's previous record; `None` on its first.
    pub month_gap: Option<u32>,
    /// Valid returns among this record and up to `lookback - 1` before it.
    pub valid_returns: usize,
}

/// Aggregate counts from a panel check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    /// Records checked.
    pub records: usize,
    /// Distinct securities.
    pub securities: usize,
    /// Records with a missing return.
    pub missing_returns: usize,
    /// Records with market value exactly zero.
    pub zero_market_value_records: usize,
    /// Securities with at least one zero market value.
    pub zero_market_value_securities: usize,
    /// Records that follow a skipped month.
    pub gap_records: usize,
    /// Securities with at least one skipped month.
    pub gap_securities: usize,
    /// Records whose trailing window is not fully populated.
    pub short_windows: usize,
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "records:                   {}", self.records)?;
        writeln!(f, "securities:                {}", self.securities)?;
        writeln!(f, "missing returns:           {}", self.missing_returns)?;
        writeln!(f, "zero market value records: {}", self.zero_market_value_records)?;
        writeln!(f, "zero market value ids:     {}", self.zero_market_value_securities)?;
        writeln!(f, "records after a gap:       {}", self.gap_records)?;
        writeln!(f, "securities with gaps:      {}", self.gap_securities)?;
        write!(f, "short trailing windows:    {}", self.short_windows)
    }
}

/// Result of [`check_panel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelCheck {
    /// One entry per panel record, in panel order.
    pub records: Vec<RecordCheck>,
    /// Aggregate counts.
    pub summary: CheckSummary,
}

/// Inspect month gaps, trailing return coverage and zero market values.
///
/// `lookback` is the formation window in records; a record has a short
/// window when fewer than `lookback` valid returns end at it.
#[must_use]
pub fn check_panel(panel: &Panel, lookback: usize) -> PanelCheck {
    let mut records = Vec::with_capacity(panel.len());
    let mut summary = CheckSummary { records: panel.len(), ..CheckSummary::default() };
    let mut zero_mv: BTreeSet<SecurityId> = BTreeSet::new();
    let mut gapped: BTreeSet<SecurityId> = BTreeSet::new();

    for group in panel.by_security() {
        summary.securities += 1;
        for (i, r) in group.iter().enumerate() {
            let month_gap = i.checked_sub(1).map(|p| r.month_index - group[p].month_index);
            let start = (i + 1).saturating_sub(lookback);
            let valid_returns = group[start..=i].iter().filter(|x| x.ret.is_some()).count();

            if r.ret.is_none() {
                summary.missing_returns += 1;
            }
            if r.market_value == Some(0.0) {
                summary.zero_market_value_records += 1;
                zero_mv.insert(r.security_id);
            }
            if month_gap.is_some_and(|g| g > 1) {
                summary.gap_records += 1;
                gapped.insert(r.security_id);
            }
            if valid_returns < lookback {
                summary.short_windows += 1;
            }

            records.push(RecordCheck { security_id: r.security_id, date: r.date, month_gap, valid_returns });
        }
    }

    summary.zero_market_value_securities = zero_mv.len();
    summary.gap_securities = gapped.len();

    info!(
        records = summary.records,
        securities = summary.securities,
        gap_records = summary.gap_records,
        zero_market_value = summary.zero_market_value_records,
        "checked panel"
    );

    PanelCheck { records, summary }
}

#[cfg(test)]
mod tests {
    use jtmom_primitives::{ExchangeCode, SecurityMonthRecord};

    use super::*;

    fn record(id: i64, month: u32, ret: Option<f64>, mv: f64) -> SecurityMonthRecord {
        SecurityMonthRecord {
            security_id: SecurityId::new(id),
            date: jtmom_primitives::month_end(Date::from_ymd_opt(2001, month, 1).unwrap()),
            ret,
            price: Some(1.0),
            shares_outstanding: Some(mv * 1000.0),
            exchange_code: ExchangeCode::NYSE,
            market_value: Some(mv),
            month_index: month,
        }
    }

    #[test]
    fn gaps_and_trailing_counts() {
        let panel = Panel::new(vec![
            record(1, 1, Some(0.01), 5.0),
            record(1, 2, None, 5.0),
            record(1, 3, Some(0.02), 0.0),
            record(2, 1, Some(0.01), 3.0),
            record(2, 4, Some(0.01), 3.0),
        ]);

        let check = check_panel(&panel, 2);
        let gaps: Vec<Option<u32>> = check.records.iter().map(|r| r.month_gap).collect();
        assert_eq!(gaps, vec![None, Some(1), Some(1), None, Some(3)]);

        let counts: Vec<usize> = check.records.iter().map(|r| r.valid_returns).collect();
        assert_eq!(counts, vec![1, 1, 1, 1, 2]);

        let s = check.summary;
        assert_eq!(s.records, 5);
        assert_eq!(s.securities, 2);
        assert_eq!(s.missing_returns, 1);
        assert_eq!(s.zero_market_value_records, 1);
        assert_eq!(s.zero_market_value_securities, 1);
        assert_eq!(s.gap_records, 1);
        assert_eq!(s.gap_securities, 1);
        assert_eq!(s.short_windows, 4);
    }

    #[test]
    fn summary_display_lists_counts() {
        let text = check_panel(&Panel::default(), 6).summary.to_string();
        assert!(text.starts_with("records:"));
        assert!(text.contains("securities with gaps"));
    }
}
