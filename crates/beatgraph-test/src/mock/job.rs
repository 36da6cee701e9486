//! Mock job service for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use beatgraph_core::{
    Error, JobAccepted, JobProvider, JobRequest, JobStatusReport, Result, RunId, RunStatus,
    ServiceHealth,
};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Base URL of the assets reported by unscripted runs.
pub const MOCK_ASSET_BASE_URL: &str = "https://assets.mock.beatgraph.dev";

/// Configuration for the mock job provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockJobConfig {
    /// Status checks an unscripted run reports `processing` before it
    /// completes.
    #[cfg_attr(feature = "config", arg(long, env = "MOCK_COMPLETE_AFTER", default_value_t = 1))]
    #[serde(default = "default_complete_after")]
    pub complete_after: u32,

    /// Artificial latency of each status check, in milliseconds.
    #[cfg_attr(feature = "config", arg(long, env = "MOCK_STATUS_DELAY_MS", default_value_t = 0))]
    #[serde(default)]
    pub status_delay_ms: u64,
}

fn default_complete_after() -> u32 {
    1
}

impl Default for MockJobConfig {
    fn default() -> Self {
        Self {
            complete_after: default_complete_after(),
            status_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Report(JobStatusReport),
    Unavailable,
}

#[derive(Debug, Default)]
struct JobState {
    script: VecDeque<Scripted>,
    last: Option<Scripted>,
    fail_submit: bool,
    health: Option<ServiceHealth>,
    status_delay: Duration,
    requests: Vec<JobRequest>,
    checks: HashMap<RunId, u32>,
    status_count: usize,
    in_flight: usize,
    max_in_flight: usize,
}

/// Mock job provider for testing.
///
/// Status checks answer from a script of reports shared by every run. Once
/// the script runs out the last entry repeats. Without a script each run
/// reports `processing` for [`MockJobConfig::complete_after`] checks and then
/// completes with an asset under [`MOCK_ASSET_BASE_URL`].
#[derive(Debug, Clone, Default)]
pub struct MockJobProvider {
    config: MockJobConfig,
    state: Arc<Mutex<JobState>>,
}

impl MockJobProvider {
    /// Creates a mock provider with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock provider with the given configuration.
    pub fn from_config(config: MockJobConfig) -> Self {
        let provider = Self {
            config,
            state: Arc::default(),
        };
        provider.lock().status_delay = Duration::from_millis(provider.config.status_delay_ms);
        provider
    }

    /// Appends a report to the status script.
    #[must_use]
    pub fn with_status(self, report: JobStatusReport) -> Self {
        self.lock().script.push_back(Scripted::Report(report));
        self
    }

    /// Appends a failing status check to the status script.
    #[must_use]
    pub fn with_status_error(self) -> Self {
        self.lock().script.push_back(Scripted::Unavailable);
        self
    }

    /// Makes every submission fail with a service-unavailable error.
    #[must_use]
    pub fn with_failing_submit(self) -> Self {
        self.lock().fail_submit = true;
        self
    }

    /// Makes health checks report `health`.
    #[must_use]
    pub fn with_health(self, health: ServiceHealth) -> Self {
        self.lock().health = Some(health);
        self
    }

    /// Delays every status check by `delay`.
    #[must_use]
    pub fn with_status_delay(self, delay: Duration) -> Self {
        self.lock().status_delay = delay;
        self
    }

    /// Returns the accepted submissions, oldest first.
    pub fn requests(&self) -> Vec<JobRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of accepted submissions.
    pub fn submit_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Returns the number of status checks started so far.
    pub fn status_count(&self) -> usize {
        self.lock().status_count
    }

    /// Returns the highest number of status checks that were in flight at
    /// the same time.
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_report(&self, run_id: &RunId) -> Result<JobStatusReport> {
        let mut state = self.lock();
        let scripted = match state.script.pop_front() {
            Some(scripted) => {
                state.last = Some(scripted.clone());
                Some(scripted)
            }
            None => state.last.clone(),
        };

        match scripted {
            Some(Scripted::Report(report)) => Ok(report),
            Some(Scripted::Unavailable) => {
                Err(Error::service_unavailable().with_message("mock status check failed"))
            }
            None => {
                let checks = state.checks.entry(run_id.clone()).or_default();
                *checks += 1;
                if *checks >= self.config.complete_after {
                    Ok(JobStatusReport::completed(format!(
                        "{MOCK_ASSET_BASE_URL}/{run_id}.mp4"
                    )))
                } else {
                    Ok(JobStatusReport::pending(RunStatus::Processing))
                }
            }
        }
    }
}

/// Marks a status check as in flight until dropped.
struct InFlight<'a> {
    provider: &'a MockJobProvider,
}

impl<'a> InFlight<'a> {
    fn enter(provider: &'a MockJobProvider) -> Self {
        let mut state = provider.lock();
        state.status_count += 1;
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
        Self { provider }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.provider.lock().in_flight -= 1;
    }
}

#[async_trait::async_trait]
impl JobProvider for MockJobProvider {
    async fn submit(&self, request: &JobRequest) -> Result<JobAccepted> {
        let mut state = self.lock();
        if state.fail_submit {
            return Err(Error::service_unavailable().with_message("mock job service is down"));
        }

        state.requests.push(request.clone());
        Ok(JobAccepted::queued(format!("mock-run-{}", state.requests.len())))
    }

    async fn status(&self, run_id: &RunId) -> Result<JobStatusReport> {
        let _in_flight = InFlight::enter(self);

        let delay = self.lock().status_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.next_report(run_id)
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        let health = self.lock().health.clone();
        Ok(health.unwrap_or_else(ServiceHealth::healthy))
    }
}
