#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod health;
mod ids;

pub mod job;
pub mod store;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use ids::{EdgeId, GraphId, NodeId, RunId};
pub use job::{JobAccepted, JobProvider, JobRequest, JobService, JobStatusReport, RunStatus};
pub use store::{GraphRecord, GraphStore, GraphStoreProvider, GraphSummary, StoredGraph};

/// Tracing target for job service operations.
pub const TRACING_TARGET_JOB: &str = "beatgraph_core::job";

/// Tracing target for graph store operations.
pub const TRACING_TARGET_STORE: &str = "beatgraph_core::store";
