//! # jtmom
//!
//! Momentum portfolio research in the style of Jegadeesh and Titman (1993).
//!
//! This crate provides a unified interface to the jtmom crates. Individual
//! components can be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Dates, identifiers and record types
//! - `traits`: Provider and joiner abstractions
//! - `math`: Quantiles, return compounding and Newey-West tests
//! - `panel`: Panel cleaning, data checks and CSV providers
//! - `formation`: Formation-period ranking
//! - `holding`: Holding-period joins
//! - `model`: Aggregation, summaries and end-to-end studies
//! - `cli`: The `jtmom` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use jtmom::model::{MomentumStudy, StudyConfig};
//! use jtmom::panel::CsvPanelProvider;
//!
//! let provider = CsvPanelProvider::new("msf.csv");
//! let result = MomentumStudy::with_config(StudyConfig::jegadeesh_titman()).run_provider(&provider)?;
//! println!("{}", result.summary);
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Used only by the binary.
#[cfg(feature = "cli")]
use {anyhow as _, clap as _, tracing as _, tracing_subscriber as _};

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use jtmom_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use jtmom_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use jtmom_math as math;
#[cfg(feature = "panel")]
#[doc(inline)]
pub use jtmom_panel as panel;
#[cfg(feature = "formation")]
#[doc(inline)]
pub use jtmom_formation as formation;
#[cfg(feature = "holding")]
#[doc(inline)]
pub use jtmom_holding as holding;
#[cfg(feature = "model")]
#[doc(inline)]
pub use jtmom_model as model;
