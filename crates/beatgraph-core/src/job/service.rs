//! Job service wrapper with observability.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::{JobAccepted, JobProvider, JobRequest, JobStatusReport};
use crate::{Result, RunId, ServiceHealth, TRACING_TARGET_JOB};

/// Job service wrapper with observability.
///
/// This wrapper adds structured logging to any job provider implementation.
/// The inner provider is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct JobService {
    inner: Arc<dyn JobProvider>,
}

impl fmt::Debug for JobService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobService").finish_non_exhaustive()
    }
}

impl JobService {
    /// Create a new job service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: JobProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Create a job service from an already shared provider.
    pub fn from_arc(provider: Arc<dyn JobProvider>) -> Self {
        Self { inner: provider }
    }

    /// Submits a node for execution.
    pub async fn submit(&self, request: &JobRequest) -> Result<JobAccepted> {
        let started_at = Instant::now();

        tracing::debug!(
            target: TRACING_TARGET_JOB,
            node_id = %request.node_id,
            node_kind = %request.node_kind,
            input_count = request.inputs.len(),
            "Submitting job"
        );

        let result = self.inner.submit(request).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(accepted) => {
                tracing::info!(
                    target: TRACING_TARGET_JOB,
                    node_id = %request.node_id,
                    run_id = %accepted.run_id,
                    status = %accepted.status,
                    elapsed_ms = elapsed.as_millis(),
                    "Job accepted"
                );
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_JOB,
                    node_id = %request.node_id,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Job submission failed"
                );
            }
        }

        result
    }

    /// Fetches the current status of a run.
    pub async fn status(&self, run_id: &RunId) -> Result<JobStatusReport> {
        let started_at = Instant::now();
        let result = self.inner.status(run_id).await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(report) => {
                tracing::trace!(
                    target: TRACING_TARGET_JOB,
                    run_id = %run_id,
                    status = %report.status,
                    elapsed_ms = elapsed.as_millis(),
                    "Job status checked"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_JOB,
                    run_id = %run_id,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Job status check failed"
                );
            }
        }

        result
    }

    /// Performs a health check on the underlying provider.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        let started_at = Instant::now();
        let result = self.inner.health_check().await;
        let elapsed = started_at.elapsed();

        match &result {
            Ok(health) => {
                tracing::debug!(
                    target: TRACING_TARGET_JOB,
                    status = ?health.status,
                    elapsed_ms = elapsed.as_millis(),
                    "Job service health checked"
                );
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_JOB,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Job service health check failed"
                );
            }
        }

        result
    }
}
