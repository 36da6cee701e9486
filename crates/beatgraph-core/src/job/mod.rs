//! Generation job service contract.
//!
//! The job service is an opaque asynchronous backend: a node is submitted
//! once and its progress is observed by polling. No push channel is assumed.

mod request;
mod response;
mod service;

pub use request::JobRequest;
pub use response::{JobAccepted, JobStatusReport, RunStatus};
pub use service::JobService;

use crate::{Result, RunId, ServiceHealth};

/// Core trait for generation backends.
///
/// Implement this trait to connect the run state machine to a concrete
/// job service.
#[async_trait::async_trait]
pub trait JobProvider: Send + Sync {
    /// Submits a node for execution and returns the issued run id.
    async fn submit(&self, request: &JobRequest) -> Result<JobAccepted>;

    /// Fetches the current status of a previously submitted run.
    async fn status(&self, run_id: &RunId) -> Result<JobStatusReport>;

    /// Performs a health check on the job service.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
