//! Job service implementation.

use std::time::Instant;

use beatgraph_core::{
    JobAccepted, JobProvider, JobRequest, JobStatusReport, Result, RunId, ServiceHealth,
};

use crate::{ReqwestClient, TRACING_TARGET};

#[async_trait::async_trait]
impl JobProvider for ReqwestClient {
    async fn submit(&self, request: &JobRequest) -> Result<JobAccepted> {
        let url = self.endpoint(&["jobs"])?;
        tracing::debug!(
            target: TRACING_TARGET,
            url = %url,
            node_id = %request.node_id,
            "Posting job"
        );

        let accepted = self.send_json(self.http().post(url).json(request)).await?;
        Ok(accepted)
    }

    async fn status(&self, run_id: &RunId) -> Result<JobStatusReport> {
        let url = self.endpoint(&["jobs", run_id.as_str()])?;
        let report = self.send_json(self.http().get(url)).await?;
        Ok(report)
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let url = self.endpoint(&["health"])?;
        let started_at = Instant::now();
        let outcome = self.send_empty(self.http().get(url)).await;
        let elapsed = started_at.elapsed();

        let health = match outcome {
            Ok(()) => ServiceHealth::healthy(),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Health check failed"
                );
                ServiceHealth::unhealthy(error.to_string())
            }
        };
        Ok(health.with_response_time(elapsed))
    }
}
