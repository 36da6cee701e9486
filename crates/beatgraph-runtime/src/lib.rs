#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod document;
pub mod graph;
pub mod persist;
pub mod registry;
pub mod resolve;
pub mod run;
pub mod schedule;

#[doc(hidden)]
pub mod prelude;

/// Tracing target for graph mutations and events.
pub const TRACING_TARGET_GRAPH: &str = "beatgraph_runtime::graph";

/// Tracing target for document sanitization.
pub const TRACING_TARGET_DOCUMENT: &str = "beatgraph_runtime::document";

/// Tracing target for scheduling and rhythm analysis.
pub const TRACING_TARGET_SCHEDULE: &str = "beatgraph_runtime::schedule";

/// Tracing target for run submission and polling.
pub const TRACING_TARGET_RUN: &str = "beatgraph_runtime::run";

/// Tracing target for graph persistence.
pub const TRACING_TARGET_PERSIST: &str = "beatgraph_runtime::persist";
