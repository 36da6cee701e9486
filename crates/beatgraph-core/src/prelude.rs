//! Prelude module for convenient imports.

pub use crate::error::{Error, ErrorKind, Result};
pub use crate::ids::{EdgeId, GraphId, NodeId, RunId};
pub use crate::job::{JobAccepted, JobProvider, JobRequest, JobService, JobStatusReport, RunStatus};
pub use crate::store::{GraphRecord, GraphStore, GraphStoreProvider, GraphSummary, StoredGraph};
