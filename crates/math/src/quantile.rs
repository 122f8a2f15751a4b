//! Cross-sectional quantiles and breakpoint bucketing.

use polars::prelude::*;

use crate::MathError;

/// Linear-interpolated quantile of `target` within each `over_col` group,
/// broadcast back to every row of the group.
///
/// `target` may be filtered, e.g. to a reference subset of each group.
pub fn quantile_xsection(target: Expr, over_col: &str, q: f64) -> Expr {
    target.quantile(lit(q), QuantileMethod::Linear).over([col(over_col)])
}

/// Name of the `i`-th cut column produced by [`breakpoint_exprs`].
#[must_use]
pub fn breakpoint_column(i: usize) -> String {
    format!("cut_{i}")
}

/// Aggregations for the cut points at quantiles `i / n_buckets`, `i` in
/// `1..n_buckets`, aliased with [`breakpoint_column`].
///
/// Intended for `group_by(..).agg(..)`; quantiles are linear-interpolated.
pub fn breakpoint_exprs(target_col: &str, n_buckets: usize) -> Vec<Expr> {
    (1..n_buckets)
        .map(|i| {
            col(target_col)
                .quantile(lit(i as f64 / n_buckets as f64), QuantileMethod::Linear)
                .alias(breakpoint_column(i))
        })
        .collect()
}

/// Rank cut points.
///
/// Bucketing is right-closed: rank 1 holds values `<= cut[0]`, rank `i` holds
/// `(cut[i-2], cut[i-1]]`, and rank `n` holds values above the last cut.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoints {
    cuts: Vec<f64>,
}

impl Breakpoints {
    /// Wrap ascending cut points.
    ///
    /// # Errors
    /// Returns `MathError::NonFinite` if a cut is not finite.
    pub fn new(cuts: Vec<f64>) -> Result<Self, MathError> {
        if let Some(bad) = cuts.iter().find(|c| !c.is_finite()) {
            return Err(MathError::NonFinite(*bad));
        }
        Ok(Self { cuts })
    }

    /// Cut points, ascending.
    #[must_use]
    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }

    /// Number of buckets.
    #[must_use]
    pub fn n_buckets(&self) -> usize {
        self.cuts.len() + 1
    }

    /// Whether every cut point differs from its neighbours.
    #[must_use]
    pub fn is_strictly_increasing(&self) -> bool {
        self.cuts.windows(2).all(|w| w[0] < w[1])
    }

    /// Whether `low`, the cuts and `high` are strictly increasing together,
    /// so that no bucket is empty by construction.
    #[must_use]
    pub fn separates(&self, low: f64, high: f64) -> bool {
        self.is_strictly_increasing()
            && self.cuts.first().is_some_and(|c| low < *c)
            && self.cuts.last().is_some_and(|c| *c < high)
    }

    /// 1-based bucket of `value`.
    #[must_use]
    pub fn bucket(&self, value: f64) -> u32 {
        self.cuts.partition_point(|&c| c < value) as u32 + 1
    }
}

/// 1-based equal-count bucket of the element at `position` in a sorted
/// sample of `len` elements.
#[must_use]
pub const fn positional_rank(position: usize, len: usize, n_buckets: usize) -> u32 {
    if len == 0 {
        return 1;
    }
    (position * n_buckets / len) as u32 + 1
}
