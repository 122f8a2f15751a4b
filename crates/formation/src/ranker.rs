//! Formation-period ranking.

use std::collections::HashMap;

use jtmom_math::{
    Breakpoints, breakpoint_column, breakpoint_exprs, contiguous_span, positional_rank,
    quantile_xsection, trailing_compound_return,
};
use jtmom_primitives::{
    Date, FormationRecord, FormationSet, Panel, SecurityId,
    columns::{
        DATE, EXCHANGE, MARKET_VALUE, MONTH_INDEX, PAST_RETURN, PRICE, RANK, RET, SECURITY_ID,
        WEIGHT,
    },
    frame::{dates, floats, integers},
    next_month_begin, shift_month_end,
};
use polars::prelude::*;
use tracing::{info, warn};

use crate::{FormationConfig, FormationError, MarketValueFilter};

const MV_FLOOR: &str = "mv_floor";
const POSITION: &str = "position";
const MEMBERS: &str = "members";
const LOW: &str = "low";
const HIGH: &str = "high";

/// Breakpoints of one formation month with the sample's extremes.
#[derive(Debug, Clone)]
struct MonthBreakpoints {
    breakpoints: Breakpoints,
    low: f64,
    high: f64,
}

/// Assigns every eligible security-month to a momentum portfolio.
///
/// For each month, securities are ranked by their compounded return over the
/// trailing window into `n_portfolios` buckets; rank 1 holds the losers.
#[derive(Debug, Clone, Default)]
pub struct FormationRanker {
    config: FormationConfig,
}

impl FormationRanker {
    /// Create a ranker with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ranker with a custom configuration.
    #[must_use]
    pub const fn with_config(config: FormationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// Rank the panel.
    ///
    /// # Errors
    /// Returns `FormationError::InvalidConfig` for out-of-range parameters,
    /// `FormationError::Polars` if a frame operation fails and
    /// `FormationError::Math` if breakpoints are not finite.
    pub fn rank(&self, panel: &Panel) -> Result<FormationSet, FormationError> {
        self.config.validate()?;

        let mut eligible = self.eligible(panel)?;
        let ranks = self.assign_ranks(&eligible)?;
        eligible.with_column(Column::new(RANK.into(), ranks))?;

        let weighted = eligible
            .lazy()
            .filter(col(RANK).is_not_null())
            .with_column(value_weight().alias(WEIGHT))
            .collect()?;

        let set = FormationSet::new(self.records(&weighted)?, self.config.n_portfolios);
        let diagnostics = set.diagnostics();
        info!(
            observations = diagnostics.observations,
            formation_months = diagnostics.formation_months,
            "rank data observations"
        );
        for m in &diagnostics.per_rank {
            info!(rank = m.rank, min = m.min, max = m.max, mean = m.mean, "portfolio membership");
        }
        Ok(set)
    }

    /// Panel rows that pass every eligibility filter, with their trailing
    /// return, sorted by date then security and numbered within each month.
    fn eligible(&self, panel: &Panel) -> Result<DataFrame, FormationError> {
        let cfg = &self.config;
        let lag = usize::from(cfg.skip_formation_month);

        let mut past_return = trailing_compound_return(
            RET,
            SECURITY_ID,
            cfg.window(),
            lag,
            cfg.fill_missing_with_zero,
        );
        if cfg.require_no_gap {
            let span = cfg.lookback_months - 1;
            past_return = when(contiguous_span(MONTH_INDEX, SECURITY_ID, span))
                .then(past_return)
                .otherwise(lit(NULL).cast(DataType::Float64));
        }

        let mut lf = panel.to_frame()?.lazy().with_column(past_return.alias(PAST_RETURN));

        lf = match cfg.market_value_filter {
            MarketValueFilter::None => lf,
            MarketValueFilter::Positive => lf.filter(col(MARKET_VALUE).gt(lit(0.0))),
            MarketValueFilter::AboveReferencePercentile { percentile } => {
                let reference = col(MARKET_VALUE)
                    .filter(col(EXCHANGE).eq(lit(cfg.reference_exchange.get())));
                lf.with_column(quantile_xsection(reference, DATE, percentile).alias(MV_FLOOR))
                    .filter(col(MARKET_VALUE).gt_eq(col(MV_FLOOR)))
            }
        };

        if let Some(floor) = cfg.min_price {
            lf = lf.filter(col(PRICE).gt_eq(lit(floor)));
        }
        if let Some(allowed) = cfg.exchange_allowlist.as_ref().and_then(|list| {
            list.iter().map(|code| col(EXCHANGE).eq(lit(code.get()))).reduce(|a, b| a.or(b))
        }) {
            lf = lf.filter(allowed);
        }

        let ordinal = RankOptions { method: RankMethod::Ordinal, descending: false };
        Ok(lf
            .filter(col(PAST_RETURN).is_not_null())
            .sort([DATE, SECURITY_ID], SortMultipleOptions::default())
            .with_columns([
                col(PAST_RETURN).rank(ordinal, None).over([col(DATE)]).alias(POSITION),
                col(PAST_RETURN).count().over([col(DATE)]).alias(MEMBERS),
            ])
            .collect()?)
    }

    /// Cut points per formation month over the breakpoint sample.
    fn breakpoints(
        &self,
        eligible: &DataFrame,
    ) -> Result<HashMap<Date, MonthBreakpoints>, FormationError> {
        let cfg = &self.config;
        let n = cfg.n_portfolios as usize;

        let mut sample = eligible.clone().lazy();
        if cfg.use_reference_exchange_breakpoints {
            sample = sample.filter(col(EXCHANGE).eq(lit(cfg.reference_exchange.get())));
        }
        let mut aggs =
            vec![col(PAST_RETURN).min().alias(LOW), col(PAST_RETURN).max().alias(HIGH)];
        aggs.extend(breakpoint_exprs(PAST_RETURN, n));
        let cuts = sample.group_by([col(DATE)]).agg(aggs).collect()?;

        let months = dates(&cuts, DATE)?;
        let lows = floats(&cuts, LOW)?;
        let highs = floats(&cuts, HIGH)?;
        let cut_columns = (1..n)
            .map(|i| floats(&cuts, &breakpoint_column(i)))
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut out = HashMap::with_capacity(months.len());
        for (row, date) in months.into_iter().enumerate() {
            let values: Option<Vec<f64>> = cut_columns.iter().map(|c| c[row]).collect();
            if let (Some(date), Some(values), Some(low), Some(high)) =
                (date, values, lows[row], highs[row])
            {
                let breakpoints = Breakpoints::new(values)?;
                out.insert(date, MonthBreakpoints { breakpoints, low, high });
            }
        }
        Ok(out)
    }

    /// Rank of every eligible row, `None` where its month cannot be ranked.
    ///
    /// With reference breakpoints every row takes the bucket rule. With
    /// full-set breakpoints a month whose minimum, cuts and maximum are not
    /// strictly increasing is partitioned by position instead.
    fn assign_ranks(&self, eligible: &DataFrame) -> Result<Vec<Option<u32>>, FormationError> {
        let cfg = &self.config;
        let n = cfg.n_portfolios as usize;
        let months = self.breakpoints(eligible)?;

        let row_dates = dates(eligible, DATE)?;
        let past_returns = floats(eligible, PAST_RETURN)?;
        let positions = integers(eligible, POSITION)?;
        let members = integers(eligible, MEMBERS)?;

        let mut distinct = row_dates.iter().flatten().copied().collect::<Vec<_>>();
        distinct.dedup();
        let reference = cfg.use_reference_exchange_breakpoints;
        for date in &distinct {
            match months.get(date) {
                None if reference => {
                    warn!(
                        %date,
                        exchange = %cfg.reference_exchange,
                        "no reference securities; month dropped"
                    );
                }
                Some(m) if !reference && !m.breakpoints.separates(m.low, m.high) => {
                    warn!(%date, "tied breakpoints; ranking by position");
                }
                _ => {}
            }
        }

        let ranks = row_dates
            .iter()
            .zip(&past_returns)
            .zip(positions.iter().zip(&members))
            .map(|((date, past_return), (position, len))| {
                let m = months.get(&(*date)?)?;
                let past_return = (*past_return)?;
                if reference || m.breakpoints.separates(m.low, m.high) {
                    return Some(m.breakpoints.bucket(past_return));
                }
                let position = usize::try_from((*position)?).ok()?.checked_sub(1)?;
                let len = usize::try_from((*len)?).ok()?;
                Some(positional_rank(position, len, n))
            })
            .collect();
        Ok(ranks)
    }

    /// Formation records from the ranked and weighted frame.
    fn records(&self, weighted: &DataFrame) -> Result<Vec<FormationRecord>, FormationError> {
        let holding = self.config.holding_months;
        let ids = integers(weighted, SECURITY_ID)?;
        let row_dates = dates(weighted, DATE)?;
        let ranks = integers(weighted, RANK)?;
        let past_returns = floats(weighted, PAST_RETURN)?;
        let market_values = floats(weighted, MARKET_VALUE)?;
        let weights = floats(weighted, WEIGHT)?;

        let mut records = Vec::with_capacity(weighted.height());
        for (row, id) in ids.into_iter().enumerate() {
            let (Some(id), Some(date), Some(rank), Some(past_return)) =
                (id, row_dates[row], ranks[row], past_returns[row])
            else {
                continue;
            };
            let Ok(rank) = u32::try_from(rank) else {
                continue;
            };
            records.push(FormationRecord {
                security_id: SecurityId::new(id),
                formation_date: date,
                rank,
                past_return,
                hold_start: next_month_begin(date),
                hold_end: shift_month_end(date, holding),
                market_value: market_values[row],
                weight: weights[row],
            });
        }
        Ok(records)
    }
}

/// Value weight within each `(date, rank)` group.
///
/// The group total ignores missing market values; the weight is null when
/// the member's market value is missing, when every member's is, or when the
/// total is not positive.
fn value_weight() -> Expr {
    let group = [col(DATE), col(RANK)];
    let total = col(MARKET_VALUE).sum().over(group.clone());
    let present = col(MARKET_VALUE).count().over(group);
    when(present.gt(lit(0)).and(total.clone().gt(lit(0.0))))
        .then(col(MARKET_VALUE) / total)
        .otherwise(lit(NULL).cast(DataType::Float64))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use approx::assert_relative_eq;
    use jtmom_primitives::{ExchangeCode, SecurityMonthRecord, month_end};
    use rstest::rstest;

    use super::*;

    fn month(i: u32) -> Date {
        shift_month_end(Date::from_ymd_opt(2000, 1, 31).unwrap(), i - 1)
    }

    fn record(id: i64, idx: u32, ret: Option<f64>, mv: Option<f64>, exch: i64) -> SecurityMonthRecord {
        SecurityMonthRecord {
            security_id: SecurityId::new(id),
            date: month(idx),
            ret,
            price: Some(10.0),
            shares_outstanding: mv.map(|v| v * 100.0),
            exchange_code: ExchangeCode::new(exch),
            market_value: mv,
            month_index: idx,
        }
    }

    fn simple_config(j: usize, n: u32) -> FormationConfig {
        FormationConfig {
            lookback_months: j,
            holding_months: 3,
            n_portfolios: n,
            fill_missing_with_zero: false,
            skip_formation_month: false,
            require_no_gap: false,
            market_value_filter: MarketValueFilter::None,
            min_price: None,
            exchange_allowlist: None,
            use_reference_exchange_breakpoints: false,
            reference_exchange: ExchangeCode::NYSE,
        }
    }

    /// Ten securities over three months; security `i` earns `i` percent a month.
    fn ladder() -> Panel {
        Panel::new(
            (1..=10)
                .flat_map(|id| {
                    (1..=3).map(move |m| {
                        let exch = if id % 2 == 0 { 1 } else { 3 };
                        record(id, m, Some(id as f64 / 100.0), Some(id as f64), exch)
                    })
                })
                .collect(),
        )
    }

    #[test]
    fn buckets_partition_each_month() {
        let set = FormationRanker::with_config(simple_config(2, 5)).rank(&ladder()).unwrap();

        // Two formation months (2 and 3), ten securities each.
        assert_eq!(set.len(), 20);
        let mut seen = BTreeSet::new();
        for r in set.records() {
            assert!((1..=5).contains(&r.rank));
            assert!(seen.insert((r.security_id, r.formation_date)));
        }
        for r in set.records() {
            let expected = (r.security_id.get() as u32 + 1) / 2;
            assert_eq!(r.rank, expected, "security {}", r.security_id);
        }
        assert!(set.diagnostics().per_rank.iter().all(|m| m.min == 2 && m.max == 2));
    }

    #[test]
    fn past_return_compounds_window() {
        let set = FormationRanker::with_config(simple_config(2, 2)).rank(&ladder()).unwrap();
        let r = set.records().iter().find(|r| r.security_id == SecurityId(3)).unwrap();
        assert_relative_eq!(r.past_return, 1.03f64 * 1.03 - 1.0, epsilon = 1e-12);
        assert_eq!(r.formation_date, month(2));
        assert_eq!(r.hold_start, Date::from_ymd_opt(2000, 3, 1).unwrap());
        assert_eq!(r.hold_end, month(5));
    }

    #[test]
    fn weights_sum_to_one_within_rank() {
        let set = FormationRanker::with_config(simple_config(2, 2)).rank(&ladder()).unwrap();
        let mut sums: BTreeMap<(Date, u32), f64> = BTreeMap::new();
        for r in set.records() {
            *sums.entry((r.formation_date, r.rank)).or_default() += r.weight.unwrap();
        }
        for total in sums.values() {
            assert_relative_eq!(*total, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn missing_market_value_weights() {
        // Returns 0%, 1%, 20%: the median cut puts securities 1 and 2 in rank 1.
        let panel = Panel::new(vec![
            record(1, 1, Some(0.0), Some(3.0), 1),
            record(2, 1, Some(0.01), None, 1),
            record(3, 1, Some(0.2), None, 1),
        ]);
        let set = FormationRanker::with_config(simple_config(1, 2)).rank(&panel).unwrap();
        let weights: Vec<(u32, Option<f64>)> =
            set.records().iter().map(|r| (r.rank, r.weight)).collect();
        assert_eq!(weights, vec![(1, Some(1.0)), (1, None), (2, None)]);
    }

    #[rstest]
    #[case::large_cap_moves_the_floor(true, false)]
    #[case::without_large_cap(false, true)]
    fn short_history_large_cap_sets_size_floor(
        #[case] with_large_cap: bool,
        #[case] mid_cap_kept: bool,
    ) {
        let mut config = simple_config(3, 2);
        config.market_value_filter = MarketValueFilter::AboveReferencePercentile { percentile: 0.5 };

        let mut records: Vec<SecurityMonthRecord> = (1..=3)
            .flat_map(|m| {
                [
                    record(2, m, Some(0.01), Some(20.0), 1),
                    record(3, m, Some(0.02), Some(40.0), 1),
                    record(5, m, Some(0.03), Some(35.0), 3),
                ]
            })
            .collect();
        if with_large_cap {
            // Listed in month 3 only, so it has no trailing return of its own.
            records.push(record(1, 3, Some(0.05), Some(100.0), 1));
        }

        let set = FormationRanker::with_config(config).rank(&Panel::new(records)).unwrap();
        assert!(set.records().iter().all(|r| r.formation_date == month(3)));
        assert!(set.records().iter().all(|r| r.security_id != SecurityId(1)));
        let mid_cap = set.records().iter().any(|r| r.security_id == SecurityId(5));
        assert_eq!(mid_cap, mid_cap_kept);
    }

    #[test]
    fn gap_invalidates_window() {
        let mut config = simple_config(3, 2);
        config.require_no_gap = true;
        // Security 1 is missing month 2; security 2 and 3 are complete.
        let panel = Panel::new(vec![
            record(1, 1, Some(0.1), Some(1.0), 1),
            record(1, 3, Some(0.1), Some(1.0), 1),
            record(1, 4, Some(0.1), Some(1.0), 1),
            record(2, 1, Some(0.1), Some(1.0), 1),
            record(2, 2, Some(0.1), Some(1.0), 1),
            record(2, 3, Some(0.1), Some(1.0), 1),
            record(2, 4, Some(0.2), Some(1.0), 1),
            record(3, 1, Some(0.1), Some(1.0), 1),
            record(3, 2, Some(0.1), Some(1.0), 1),
            record(3, 3, Some(0.1), Some(1.0), 1),
            record(3, 4, Some(0.3), Some(1.0), 1),
        ]);

        let set = FormationRanker::with_config(config.clone()).rank(&panel).unwrap();
        assert!(set.records().iter().all(|r| r.security_id != SecurityId(1)));

        config.require_no_gap = false;
        let set = FormationRanker::with_config(config).rank(&panel).unwrap();
        // Row-based window: security 1 is ranked at month 4 over records 1, 3, 4.
        assert!(set.records().iter().any(|r| r.security_id == SecurityId(1) && r.formation_date == month(4)));
    }

    #[test]
    fn skip_excludes_formation_month() {
        let mut config = simple_config(3, 2);
        config.skip_formation_month = true;
        let panel = Panel::new(vec![
            record(1, 1, Some(0.1), Some(1.0), 1),
            record(1, 2, Some(0.2), Some(1.0), 1),
            record(1, 3, Some(0.9), Some(1.0), 1),
            record(2, 1, Some(0.0), Some(1.0), 1),
            record(2, 2, Some(0.0), Some(1.0), 1),
            record(2, 3, Some(0.0), Some(1.0), 1),
        ]);

        let set = FormationRanker::with_config(config).rank(&panel).unwrap();
        let r = set.records().iter().find(|r| r.security_id == SecurityId(1)).unwrap();
        assert_eq!(r.formation_date, month(3));
        assert_relative_eq!(r.past_return, 1.1 * 1.2 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_return_propagates_unless_filled() {
        let panel = Panel::new(vec![
            record(1, 1, None, Some(1.0), 1),
            record(1, 2, Some(0.1), Some(1.0), 1),
            record(2, 1, Some(0.0), Some(1.0), 1),
            record(2, 2, Some(0.0), Some(1.0), 1),
        ]);

        let mut config = simple_config(2, 2);
        let set = FormationRanker::with_config(config.clone()).rank(&panel).unwrap();
        assert_eq!(set.len(), 1);

        config.fill_missing_with_zero = true;
        let set = FormationRanker::with_config(config).rank(&panel).unwrap();
        assert_eq!(set.len(), 2);
        let r = set.records().iter().find(|r| r.security_id == SecurityId(1)).unwrap();
        assert_relative_eq!(r.past_return, 0.1, epsilon = 1e-12);
        assert_eq!(r.rank, 2);
    }

    #[rstest]
    #[case(Some(vec![ExchangeCode::NYSE]), 10)]
    #[case(Some(vec![ExchangeCode::NASDAQ]), 10)]
    #[case(None, 20)]
    fn exchange_allowlist(#[case] allow: Option<Vec<ExchangeCode>>, #[case] expected: usize) {
        let mut config = simple_config(2, 2);
        config.exchange_allowlist = allow;
        let set = FormationRanker::with_config(config).rank(&ladder()).unwrap();
        assert_eq!(set.len(), expected);
    }

    #[test]
    fn price_floor() {
        let mut config = simple_config(1, 2);
        config.min_price = Some(5.0);
        let mut cheap = record(3, 1, Some(0.0), Some(1.0), 1);
        cheap.price = Some(4.99);
        let panel = Panel::new(vec![
            record(1, 1, Some(0.0), Some(1.0), 1),
            record(2, 1, Some(0.1), Some(1.0), 1),
            cheap,
        ]);
        let set = FormationRanker::with_config(config).rank(&panel).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn reference_percentile_drops_small_caps() {
        let mut config = simple_config(1, 2);
        config.market_value_filter = MarketValueFilter::AboveReferencePercentile { percentile: 0.5 };
        // NYSE market values 2, 4, 6, 8, 10: median 6.
        let set = FormationRanker::with_config(config).rank(&ladder()).unwrap();
        let month_one: Vec<i64> = set
            .records()
            .iter()
            .filter(|r| r.formation_date == month(1))
            .map(|r| r.security_id.get())
            .collect();
        assert_eq!(month_one, vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn reference_breakpoints_bucket_everyone() {
        let mut config = simple_config(1, 2);
        config.use_reference_exchange_breakpoints = true;
        // NYSE past returns 2%..10% in steps of 2: median 6%.
        let set = FormationRanker::with_config(config).rank(&ladder()).unwrap();
        let winners: Vec<i64> = set
            .records()
            .iter()
            .filter(|r| r.formation_date == month(1) && r.rank == 2)
            .map(|r| r.security_id.get())
            .collect();
        assert_eq!(winners, vec![7, 8, 9, 10]);
    }

    #[test]
    fn month_without_reference_securities_is_dropped() {
        let mut config = simple_config(1, 2);
        config.use_reference_exchange_breakpoints = true;
        let panel = Panel::new(vec![
            record(1, 1, Some(0.0), Some(1.0), 3),
            record(2, 1, Some(0.1), Some(1.0), 3),
            record(1, 2, Some(0.0), Some(1.0), 1),
            record(2, 2, Some(0.1), Some(1.0), 3),
        ]);
        let set = FormationRanker::with_config(config).rank(&panel).unwrap();
        assert!(set.records().iter().all(|r| r.formation_date == month(2)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn tied_returns_rank_by_position() {
        let config = simple_config(1, 2);
        let panel = Panel::new((1..=4).map(|id| record(id, 1, Some(0.0), Some(1.0), 1)).collect());
        let set = FormationRanker::with_config(config).rank(&panel).unwrap();
        let ranks: Vec<u32> = set.records().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 1, 2, 2]);
    }

    #[test]
    fn invalid_config_rejected_before_work() {
        let ranker = FormationRanker::with_config(simple_config(0, 2));
        assert!(matches!(ranker.rank(&ladder()), Err(FormationError::InvalidConfig(_))));
    }

    #[test]
    fn month_helper_is_month_end() {
        assert_eq!(month(2), month_end(Date::from_ymd_opt(2000, 2, 10).unwrap()));
    }
}
