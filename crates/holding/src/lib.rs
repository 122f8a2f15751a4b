#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/jtmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod chunked;
pub use chunked::ChunkedJoiner;

mod query;
pub use query::QueryEngineJoiner;

mod strategy;
pub use strategy::{JoinStrategy, finalize};
