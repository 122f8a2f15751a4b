//! End-to-end momentum study.

use jtmom_formation::{FormationConfig, FormationRanker};
use jtmom_holding::JoinStrategy;
use jtmom_panel::{CleanConfig, PanelCleaner};
use jtmom_primitives::{Date, FormationSet, HoldingSet, Panel, PortfolioSeries};
use jtmom_traits::PanelProvider;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ModelError, PortfolioAggregator, PortfolioSummary, Weighting};

/// Every parameter of one study run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Panel cleaning.
    pub clean: CleanConfig,
    /// Formation ranking.
    pub formation: FormationConfig,
    /// Holding join strategy.
    pub join: JoinStrategy,
    /// Aggregation weighting.
    pub weighting: Weighting,
    /// First realized month kept.
    pub start_date: Option<Date>,
    /// Last realized month kept.
    pub end_date: Option<Date>,
    /// Newey-West lag truncation.
    pub nw_lag: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            clean: CleanConfig::default(),
            formation: FormationConfig::default(),
            join: JoinStrategy::default(),
            weighting: Weighting::Equal,
            start_date: None,
            end_date: None,
            nw_lag: 3,
        }
    }
}

impl StudyConfig {
    /// Jegadeesh and Titman (1993) 6/6 deciles, equal-weighted, 1965-1989.
    #[must_use]
    pub fn jegadeesh_titman() -> Self {
        Self {
            formation: FormationConfig::jegadeesh_titman(),
            start_date: Date::from_ymd_opt(1965, 1, 31),
            end_date: Date::from_ymd_opt(1989, 12, 31),
            ..Self::default()
        }
    }

    /// Fama-French prior (12-2) deciles over the full sample.
    #[must_use]
    pub fn fama_french() -> Self {
        Self { formation: FormationConfig::fama_french(), ..Self::default() }
    }

    /// Check the sample period and the formation parameters.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidConfig` or `ModelError::Formation`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            return Err(ModelError::InvalidConfig(format!("start {start} is after end {end}")));
        }
        self.formation.validate()?;
        Ok(())
    }
}

/// Output of a study run.
#[derive(Debug, Clone)]
pub struct StudyResult {
    /// Formation records.
    pub formations: FormationSet,
    /// Holding records.
    pub holdings: HoldingSet,
    /// Monthly portfolio returns.
    pub series: PortfolioSeries,
    /// Mean and significance per column.
    pub summary: PortfolioSummary,
}

/// Runs clean, rank, join, aggregate and summarize.
#[derive(Debug, Clone, Default)]
pub struct MomentumStudy {
    config: StudyConfig,
}

impl MomentumStudy {
    /// Create a study with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a study with a custom configuration.
    #[must_use]
    pub const fn with_config(config: StudyConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Run on an already-clean panel.
    ///
    /// # Errors
    /// Returns `ModelError` if any stage fails or no month has a return.
    pub fn run(&self, panel: &Panel) -> Result<StudyResult, ModelError> {
        self.config.validate()?;
        let cfg = &self.config;

        let formations = FormationRanker::with_config(cfg.formation.clone()).rank(panel)?;
        let holdings = cfg.join.joiner().join(&formations, panel)?;
        let series = PortfolioAggregator::new(cfg.weighting)
            .with_period(cfg.start_date, cfg.end_date)
            .aggregate(&holdings)?;
        if series.is_empty() {
            return Err(ModelError::EmptySeries);
        }
        let summary = PortfolioSummary::from_series(&series, cfg.nw_lag)?;

        info!(
            formations = formations.len(),
            holdings = holdings.len(),
            months = series.len(),
            "study complete"
        );
        Ok(StudyResult { formations, holdings, series, summary })
    }

    /// Clean a raw frame, then run.
    ///
    /// # Errors
    /// Returns `ModelError` if cleaning or any later stage fails.
    pub fn run_frame(&self, raw: &DataFrame) -> Result<StudyResult, ModelError> {
        let panel = PanelCleaner::with_config(self.config.clean.clone()).clean(raw)?;
        self.run(&panel)
    }

    /// Fetch from a provider, clean, then run.
    ///
    /// # Errors
    /// Returns `ModelError` if the provider or any later stage fails.
    pub fn run_provider<P: PanelProvider>(&self, provider: &P) -> Result<StudyResult, ModelError> {
        let raw = provider.fetch()?;
        info!(provider = provider.name(), rows = raw.height(), "fetched panel");
        self.run_frame(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let jt = StudyConfig::jegadeesh_titman();
        assert_eq!(jt.nw_lag, 3);
        assert_eq!(jt.start_date, Date::from_ymd_opt(1965, 1, 31));
        assert!(jt.validate().is_ok());

        let ff = StudyConfig::fama_french();
        assert_eq!(ff.formation.lookback_months, 12);
        assert!(ff.start_date.is_none());
    }

    #[test]
    fn reversed_period_rejected() {
        let config = StudyConfig {
            start_date: Date::from_ymd_opt(2000, 1, 31),
            end_date: Date::from_ymd_opt(1999, 1, 31),
            ..StudyConfig::default()
        };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn empty_panel_has_no_series() {
        let err = MomentumStudy::new().run(&Panel::default()).unwrap_err();
        assert!(matches!(err, ModelError::EmptySeries));
    }
}
