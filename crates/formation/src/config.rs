//! Formation ranking configuration.

use jtmom_primitives::ExchangeCode;
use serde::{Deserialize, Serialize};

use crate::FormationError;

/// Market-value eligibility rule applied at formation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum MarketValueFilter {
    /// No market-value condition.
    #[default]
    None,
    /// Market value must be present and positive.
    Positive,
    /// Market value must be at least the given percentile of the same
    /// month's reference-exchange market values.
    AboveReferencePercentile {
        /// Percentile in `(0, 1)`, e.g. `0.2` for the NYSE 20th percentile.
        percentile: f64,
    },
}

impl MarketValueFilter {
    /// Exclude stocks below the NYSE 20th percentile.
    #[must_use]
    pub const fn small_cap_exclusion() -> Self {
        Self::AboveReferencePercentile { percentile: 0.2 }
    }
}

/// Configuration for [`FormationRanker`](crate::FormationRanker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationConfig {
    /// Trailing return window `j`, in records.
    pub lookback_months: usize,
    /// Holding window `k`, in months.
    pub holding_months: u32,
    /// Number of rank buckets.
    pub n_portfolios: u32,
    /// Treat missing monthly returns as zero before compounding.
    pub fill_missing_with_zero: bool,
    /// Exclude the formation month from the trailing window.
    pub skip_formation_month: bool,
    /// Invalidate windows with a missing month record.
    pub require_no_gap: bool,
    /// Market-value eligibility.
    pub market_value_filter: MarketValueFilter,
    /// Minimum price at formation.
    pub min_price: Option<f64>,
    /// Eligible exchanges; `None` allows all.
    pub exchange_allowlist: Option<Vec<ExchangeCode>>,
    /// Cut points from the reference exchange only.
    pub use_reference_exchange_breakpoints: bool,
    /// Exchange for reference breakpoints and the market-value percentile.
    pub reference_exchange: ExchangeCode,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self::jegadeesh_titman()
    }
}

impl FormationConfig {
    /// Jegadeesh and Titman (1993): 6-month formation, 6-month holding,
    /// deciles, NYSE and AMEX stocks, all-stock breakpoints.
    #[must_use]
    pub fn jegadeesh_titman() -> Self {
        Self {
            lookback_months: 6,
            holding_months: 6,
            n_portfolios: 10,
            fill_missing_with_zero: true,
            skip_formation_month: false,
            require_no_gap: false,
            market_value_filter: MarketValueFilter::None,
            min_price: None,
            exchange_allowlist: Some(vec![ExchangeCode::NYSE, ExchangeCode::AMEX]),
            use_reference_exchange_breakpoints: false,
            reference_exchange: ExchangeCode::NYSE,
        }
    }

    /// Fama-French prior (12-2) deciles: 12-month window skipping the
    /// formation month, 1-month holding, positive market value, no gaps,
    /// NYSE breakpoints.
    #[must_use]
    pub fn fama_french() -> Self {
        Self {
            lookback_months: 12,
            holding_months: 1,
            n_portfolios: 10,
            fill_missing_with_zero: false,
            skip_formation_month: true,
            require_no_gap: true,
            market_value_filter: MarketValueFilter::Positive,
            min_price: None,
            exchange_allowlist: None,
            use_reference_exchange_breakpoints: true,
            reference_exchange: ExchangeCode::NYSE,
        }
    }

    /// Records compounded into the past return.
    #[must_use]
    pub const fn window(&self) -> usize {
        if self.skip_formation_month { self.lookback_months.saturating_sub(1) } else { self.lookback_months }
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    /// Returns `FormationError::InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<(), FormationError> {
        if self.lookback_months == 0 {
            return Err(FormationError::InvalidConfig("lookback must be positive".into()));
        }
        if self.skip_formation_month && self.lookback_months < 2 {
            return Err(FormationError::InvalidConfig(
                "lookback must be at least 2 when skipping the formation month".into(),
            ));
        }
        if self.holding_months == 0 {
            return Err(FormationError::InvalidConfig("holding period must be positive".into()));
        }
        if self.n_portfolios < 2 {
            return Err(FormationError::InvalidConfig(format!(
                "need at least 2 portfolios, got {}",
                self.n_portfolios
            )));
        }
        if let MarketValueFilter::AboveReferencePercentile { percentile } = self.market_value_filter
            && !(percentile > 0.0 && percentile < 1.0)
        {
            return Err(FormationError::InvalidConfig(format!(
                "market value percentile must be in (0, 1), got {percentile}"
            )));
        }
        if let Some(p) = self.min_price
            && !(p.is_finite() && p >= 0.0)
        {
            return Err(FormationError::InvalidConfig(format!(
                "minimum price must be a non-negative number, got {p}"
            )));
        }
        if self.exchange_allowlist.as_ref().is_some_and(Vec::is_empty) {
            return Err(FormationError::InvalidConfig("exchange allowlist is empty".into()));
        }
        Ok(())
    }
}
