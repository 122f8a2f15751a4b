//! Holding join delegated to the polars lazy engine.

use std::time::Instant;

use jtmom_primitives::{
    Date, FormationSet, HoldingRecord, HoldingSet, Panel, SecurityId, columns,
    frame::{dates, floats, integers},
};
use jtmom_traits::{HoldingJoiner, JoinError};
use polars::prelude::*;
use tracing::info;

use crate::finalize;

/// Equi-join on `security_id` followed by a `hold_start <= date <= hold_end`
/// filter, planned and executed by polars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryEngineJoiner;

impl QueryEngineJoiner {
    /// Create a query-engine joiner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn plan(formations: &FormationSet, panel: &Panel) -> PolarsResult<LazyFrame> {
        let windows = formations.to_frame()?.lazy().select([
            col(columns::SECURITY_ID),
            col(columns::FORMATION_DATE),
            col(columns::RANK),
            col(columns::HOLD_START),
            col(columns::HOLD_END),
            col(columns::WEIGHT),
        ]);
        let returns = panel.returns_frame(0, panel.len())?.lazy();

        Ok(windows
            .join(
                returns,
                [col(columns::SECURITY_ID)],
                [col(columns::SECURITY_ID)],
                JoinArgs::new(JoinType::Inner),
            )
            .filter(
                col(columns::DATE)
                    .gt_eq(col(columns::HOLD_START))
                    .and(col(columns::DATE).lt_eq(col(columns::HOLD_END))),
            )
            .select([
                col(columns::SECURITY_ID),
                col(columns::FORMATION_DATE),
                col(columns::RANK),
                col(columns::DATE),
                col(columns::RET),
                col(columns::WEIGHT),
            ]))
    }
}

/// Read the joined frame back into records.
fn records_from_frame(df: &DataFrame) -> Result<Vec<HoldingRecord>, JoinError> {
    let ids = integers(df, columns::SECURITY_ID)?;
    let formed = dates(df, columns::FORMATION_DATE)?;
    let ranks = integers(df, columns::RANK)?;
    let realized = dates(df, columns::DATE)?;
    let rets = floats(df, columns::RET)?;
    let weights = floats(df, columns::WEIGHT)?;

    let null = |column: &str, row: usize| JoinError::Schema(format!("null {column} at row {row}"));

    (0..df.height())
        .map(|i| {
            let security_id = ids[i].ok_or_else(|| null(columns::SECURITY_ID, i))?;
            let formation_date: Date = formed[i].ok_or_else(|| null(columns::FORMATION_DATE, i))?;
            let rank = ranks[i]
                .and_then(|r| u32::try_from(r).ok())
                .ok_or_else(|| null(columns::RANK, i))?;
            let date = realized[i].ok_or_else(|| null(columns::DATE, i))?;
            Ok(HoldingRecord {
                security_id: SecurityId::new(security_id),
                formation_date,
                rank,
                date,
                ret: rets[i],
                weight: weights[i],
                weighted_return: None,
            })
        })
        .collect()
}

impl HoldingJoiner for QueryEngineJoiner {
    fn join(&self, formations: &FormationSet, panel: &Panel) -> Result<HoldingSet, JoinError> {
        let started = Instant::now();
        let joined = Self::plan(formations, panel)?.collect()?;
        let raw = records_from_frame(&joined)?;

        let set = finalize(raw, formations.n_portfolios());
        info!(
            strategy = self.name(),
            observations = set.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "holding data observations"
        );
        Ok(set)
    }

    fn name(&self) -> &str {
        "query-engine"
    }
}
