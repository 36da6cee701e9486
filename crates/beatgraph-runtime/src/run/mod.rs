//! Node execution against the job service.
//!
//! [`RunTracker`] submits nodes, keeps the latest [`Run`] of each node and
//! polls the job service until the run finishes. Results flow back into
//! the graph through its [`GraphSession`](crate::graph::GraphSession).

mod config;
mod inputs;
mod poll;
mod state;
mod tracker;

pub use config::{DEFAULT_MAX_POLL_SECS, DEFAULT_POLL_INTERVAL_MS, RunConfig, RunConfigBuilder};
pub use inputs::{MERGE_SEPARATOR, resolve_inputs};
pub use state::{NodeRunState, Run};
pub use tracker::{RunTracker, SkipReason, Submission};
