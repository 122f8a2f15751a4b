#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/jtmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod quantile;
pub use quantile::{
    Breakpoints, breakpoint_column, breakpoint_exprs, positional_rank, quantile_xsection,
};

mod compound;
pub use compound::{contiguous_span, trailing_compound_return};

mod newey_west;
pub use newey_west::{MeanTest, bartlett_weight, newey_west_mean_test};

mod correlation;
pub use correlation::pearson;

mod error;
pub use error::MathError;
