//! Strategy selection and shared post-processing.

use std::collections::HashSet;

use jtmom_primitives::{Date, HoldingRecord, HoldingSet, SecurityId};
use jtmom_traits::HoldingJoiner;
use serde::{Deserialize, Serialize};

use crate::{ChunkedJoiner, QueryEngineJoiner};

/// Execution strategy for the holding-period join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStrategy {
    /// Batched nested-loop join.
    Chunked {
        /// Panel rows per batch.
        chunk_size: usize,
    },
    /// Declarative join in the polars lazy engine.
    QueryEngine,
}

impl Default for JoinStrategy {
    fn default() -> Self {
        Self::Chunked { chunk_size: ChunkedJoiner::DEFAULT_CHUNK_SIZE }
    }
}

impl JoinStrategy {
    /// Build the joiner for this strategy.
    #[must_use]
    pub fn joiner(self) -> Box<dyn HoldingJoiner> {
        match self {
            Self::Chunked { chunk_size } => Box::new(ChunkedJoiner::with_chunk_size(chunk_size)),
            Self::QueryEngine => Box::new(QueryEngineJoiner::new()),
        }
    }
}

type RowKey = (SecurityId, Date, u32, Date, Option<u64>, Option<u64>);

fn row_key(r: &HoldingRecord) -> RowKey {
    (
        r.security_id,
        r.formation_date,
        r.rank,
        r.date,
        r.ret.map(f64::to_bits),
        r.weight.map(f64::to_bits),
    )
}

/// Drop full-row duplicates, compute weighted returns and sort.
///
/// Duplicates are identified by value, so the result does not depend on the
/// order rows arrive in.
#[must_use]
pub fn finalize(raw: Vec<HoldingRecord>, n_portfolios: u32) -> HoldingSet {
    let mut seen: HashSet<RowKey> = HashSet::with_capacity(raw.len());
    let records = raw
        .into_iter()
        .filter(|r| seen.insert(row_key(r)))
        .map(|r| HoldingRecord {
            weighted_return: r.ret.zip(r.weight).map(|(ret, w)| ret * w),
            ..r
        })
        .collect();
    HoldingSet::new(records, n_portfolios)
}
