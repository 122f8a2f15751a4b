//! Trailing compounded returns.

use polars::prelude::*;

/// Compounded return over the `window` rows ending `lag` rows before each
/// row, computed within each `over_col` group.
///
/// Returns are compounded as `exp(sum(ln(1 + r))) - 1`. With `lag = 0` the
/// window ends at the current row; with `lag = 1` the current row is
/// excluded. When `fill_missing` is set, missing returns count as zero;
/// otherwise any missing return in the window yields null.
///
/// Rows must be ordered by date within each group.
pub fn trailing_compound_return(
    target_col: &str,
    over_col: &str,
    window: usize,
    lag: usize,
    fill_missing: bool,
) -> Expr {
    let returns = if fill_missing { col(target_col).fill_null(lit(0.0)) } else { col(target_col) };
    let log_returns = returns.cast(DataType::Float64).log1p();

    let lagged = log_returns.shift(lit(lag as i64)).over([col(over_col)]);
    let summed = lagged
        .rolling_sum(RollingOptionsFixedWindow {
            window_size: window,
            min_periods: window,
            ..Default::default()
        })
        .over([col(over_col)]);

    summed.exp() - lit(1.0)
}

/// Whether the `span` rows before each row, within each `over_col` group,
/// cover exactly `span` consecutive values of the integer `index_col`.
///
/// Null when the group has fewer than `span + 1` rows.
pub fn contiguous_span(index_col: &str, over_col: &str, span: usize) -> Expr {
    let index = col(index_col).cast(DataType::Int64);
    let start = index.clone().shift(lit(span as i64)).over([col(over_col)]);
    (index - start).eq(lit(span as i64))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn compound(returns: &[Option<f64>], window: usize, lag: usize, fill: bool) -> Vec<Option<f64>> {
        let df = df! {
            "id" => vec![1i64; returns.len()],
            "ret" => returns.to_vec(),
        }
        .unwrap();
        let out = df
            .lazy()
            .select([trailing_compound_return("ret", "id", window, lag, fill).alias("out")])
            .collect()
            .unwrap();
        out.column("out").unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn compounding_matches_product() {
        let out = compound(&[Some(0.1), Some(-0.05), Some(0.2)], 3, 0, false);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_relative_eq!(out[2].unwrap(), 1.1 * 0.95 * 1.2 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn lag_excludes_current_period() {
        let out = compound(&[Some(0.1), Some(0.2), Some(0.5)], 2, 1, false);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_relative_eq!(out[2].unwrap(), 1.1 * 1.2 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_returns_propagate_unless_filled() {
        let returns = [Some(0.1), None, Some(0.2)];
        assert_eq!(compound(&returns, 3, 0, false)[2], None);

        let filled = compound(&returns, 3, 0, true);
        assert_relative_eq!(filled[2].unwrap(), 1.1 * 1.2 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn total_loss_compounds_to_minus_one() {
        let out = compound(&[Some(-1.0), Some(0.5)], 2, 0, false);
        assert_relative_eq!(out[1].unwrap(), -1.0);
    }

    #[test]
    fn windows_do_not_cross_groups() {
        let df = df! {
            "id" => &[1i64, 1, 2, 2],
            "ret" => &[0.1, 0.1, 0.3, 0.3],
        }
        .unwrap();
        let out = df
            .lazy()
            .select([trailing_compound_return("ret", "id", 2, 0, false).alias("out")])
            .collect()
            .unwrap();
        let values: Vec<Option<f64>> = out.column("out").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(values[0], None);
        assert_relative_eq!(values[1].unwrap(), 0.21, epsilon = 1e-12);
        assert_eq!(values[2], None);
        assert_relative_eq!(values[3].unwrap(), 0.69, epsilon = 1e-12);
    }

    #[test]
    fn contiguity_checks_index_distance() {
        let df = df! {
            "id" => &[1i64, 1, 1, 2, 2, 2],
            "idx" => &[1u32, 2, 3, 1, 3, 4],
        }
        .unwrap();
        let out = df
            .lazy()
            .select([contiguous_span("idx", "id", 2).alias("ok")])
            .collect()
            .unwrap();
        let ok: Vec<Option<bool>> = out.column("ok").unwrap().bool().unwrap().into_iter().collect();
        assert_eq!(ok, vec![None, None, Some(true), None, None, Some(false)]);
    }
}
