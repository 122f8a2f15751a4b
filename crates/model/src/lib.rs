#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/jtmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod aggregate;
pub use aggregate::{PortfolioAggregator, Weighting};

mod significance;
pub use significance::{PortfolioSummary, SummaryRow};

mod study;
pub use study::{MomentumStudy, StudyConfig, StudyResult};

mod benchmark;
pub use benchmark::{BenchmarkComparison, compare_benchmark};

mod export;
pub use export::write_series_csv;

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use jtmom_formation::{FormationConfig, MarketValueFilter};
    pub use jtmom_holding::JoinStrategy;

    pub use super::{MomentumStudy, ModelError, PortfolioSummary, StudyConfig, Weighting};
}
