//! Formation-period portfolio assignments.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Date, SecurityId, columns, frame::date_column};

/// One eligible security ranked in one formation month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationRecord {
    /// Security identifier.
    pub security_id: SecurityId,
    /// Formation month-end.
    pub formation_date: Date,
    /// Portfolio rank in `1..=n_portfolios`; 1 holds the losers.
    pub rank: u32,
    /// Cumulative return over the lookback window.
    pub past_return: f64,
    /// First day of the holding window (day after the formation month).
    pub hold_start: Date,
    /// Last day of the holding window (month-end `k` months after formation).
    pub hold_end: Date,
    /// Market value at formation.
    pub market_value: Option<f64>,
    /// Share of the `(formation_date, rank)` group's market value.
    pub weight: Option<f64>,
}

impl FormationRecord {
    /// Whether `date` falls inside the holding window (both ends inclusive).
    #[must_use]
    pub fn covers(&self, date: Date) -> bool {
        self.hold_start <= date && date <= self.hold_end
    }
}

/// Portfolio size statistics for one rank across formation months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankMembership {
    /// Portfolio rank.
    pub rank: u32,
    /// Smallest membership over months where the rank is populated.
    pub min: usize,
    /// Largest membership.
    pub max: usize,
    /// Average membership.
    pub mean: f64,
}

/// Membership counts reported after ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipDiagnostics {
    /// One entry per populated rank, ascending.
    pub per_rank: Vec<RankMembership>,
    /// Total number of formation records.
    pub observations: usize,
    /// Number of distinct formation months.
    pub formation_months: usize,
}

impl MembershipDiagnostics {
    /// Count members per `(formation_date, rank)` and summarize by rank.
    #[must_use]
    pub fn from_records(records: &[FormationRecord]) -> Self {
        let mut counts: BTreeMap<(Date, u32), usize> = BTreeMap::new();
        for r in records {
            *counts.entry((r.formation_date, r.rank)).or_default() += 1;
        }

        let mut by_rank: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (&(_, rank), &n) in &counts {
            by_rank.entry(rank).or_default().push(n);
        }

        let per_rank = by_rank
            .into_iter()
            .map(|(rank, ns)| RankMembership {
                rank,
                min: ns.iter().copied().min().unwrap_or(0),
                max: ns.iter().copied().max().unwrap_or(0),
                mean: ns.iter().sum::<usize>() as f64 / ns.len() as f64,
            })
            .collect();

        let mut months: Vec<Date> = records.iter().map(|r| r.formation_date).collect();
        months.sort_unstable();
        months.dedup();

        Self { per_rank, observations: records.len(), formation_months: months.len() }
    }
}

/// All formation records of one configuration run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormationSet {
    records: Vec<FormationRecord>,
    n_portfolios: u32,
    diagnostics: MembershipDiagnostics,
}

impl FormationSet {
    /// Create a formation set ordered by `(security_id, formation_date)`.
    #[must_use]
    pub fn new(mut records: Vec<FormationRecord>, n_portfolios: u32) -> Self {
        records.sort_by(|a, b| {
            (a.security_id, a.formation_date).cmp(&(b.security_id, b.formation_date))
        });
        let diagnostics = MembershipDiagnostics::from_records(&records);
        Self { records, n_portfolios, diagnostics }
    }

    /// All records.
    #[must_use]
    pub fn records(&self) -> &[FormationRecord] {
        &self.records
    }

    /// Configured number of portfolios.
    #[must_use]
    pub const fn n_portfolios(&self) -> u32 {
        self.n_portfolios
    }

    /// Membership diagnostics.
    #[must_use]
    pub const fn diagnostics(&self) -> &MembershipDiagnostics {
        &self.diagnostics
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
        let start: Vec<Date> = rs.iter().map(|r| r.hold_start).collect();
        let end: Vec<Date> = rs.iter().map(|r| r.hold_end).collect();
        DataFrame::new(vec![
            Column::new(
                columns::SECURITY_ID.into(),
                rs.iter().map(|r| r.security_id.get()).collect::<Vec<_>>(),
            ),
            date_column(columns::FORMATION_DATE, &form)?,
            Column::new(columns::RANK.into(), rs.iter().map(|r| r.rank).collect::<Vec<_>>()),
            Column::new(
                columns::PAST_RETURN.into(),
                rs.iter().map(|r| r.past_return).collect::<Vec<_>>(),
            ),
            date_column(columns::HOLD_START, &start)?,
            date_column(columns::HOLD_END, &end)?,
            Column::new(
                columns::MARKET_VALUE.into(),
                rs.iter().map(|r| r.market_value).collect::<Vec<_>>(),
            ),
            Column::new(columns::WEIGHT.into(), rs.iter().map(|r| r.weight).collect::<Vec<_>>()),
        ])
    }
}
