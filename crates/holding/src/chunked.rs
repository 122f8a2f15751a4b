//! Batched nested-loop holding join.

use std::{collections::HashMap, time::Instant};

use jtmom_primitives::{FormationRecord, FormationSet, HoldingRecord, HoldingSet, Panel, SecurityId};
use jtmom_traits::{HoldingJoiner, JoinError};
use tracing::{debug, info};

use crate::finalize;

/// Joins the panel against formation windows one batch of rows at a time.
///
/// Formation windows are indexed by security; each panel row in a batch is
/// matched against its security's windows, so memory stays proportional to
/// the output plus one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedJoiner {
    chunk_size: usize,
}

impl ChunkedJoiner {
    /// Default number of panel rows per batch.
    pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

    /// Create a joiner with the default batch size.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_chunk_size(Self::DEFAULT_CHUNK_SIZE)
    }

    /// Create a joiner with a custom batch size.
    #[must_use]
    pub const fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Panel rows per batch.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Default for ChunkedJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldingJoiner for ChunkedJoiner {
    fn join(&self, formations: &FormationSet, panel: &Panel) -> Result<HoldingSet, JoinError> {
        if self.chunk_size == 0 {
            return Err(JoinError::InvalidConfig("chunk size must be positive".to_string()));
        }
        let started = Instant::now();

        let mut windows: HashMap<SecurityId, Vec<&FormationRecord>> = HashMap::new();
        for f in formations.records() {
            windows.entry(f.security_id).or_default().push(f);
        }

        let mut raw = Vec::new();
        for (chunk, rows) in panel.records().chunks(self.chunk_size).enumerate() {
            let before = raw.len();
            for row in rows {
                let Some(candidates) = windows.get(&row.security_id) else { continue };
                raw.extend(candidates.iter().filter(|f| f.covers(row.date)).map(|f| HoldingRecord {
                    security_id: row.security_id,
                    formation_date: f.formation_date,
                    rank: f.rank,
                    date: row.date,
                    ret: row.ret,
                    weight: f.weight,
                    weighted_return: None,
                }));
            }
            debug!(chunk, rows = rows.len(), matched = raw.len() - before, "joined chunk");
        }

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
        "chunked"
    }
}
