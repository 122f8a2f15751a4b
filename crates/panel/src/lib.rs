#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/jtmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod clean;
pub use clean::{CleanConfig, DuplicatePolicy, PanelCleaner, RawRecord};

mod check;
pub use check::{CheckSummary, PanelCheck, RecordCheck, check_panel};

mod provider;
pub use provider::{CsvBenchmarkProvider, CsvPanelProvider, FramePanelProvider, UniverseFilter};

mod error;
pub use error::PanelError;
