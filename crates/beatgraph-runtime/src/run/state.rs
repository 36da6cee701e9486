//! Run records and per-node run state.

use beatgraph_core::{JobStatusReport, NodeId, RunId, RunStatus};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Execution state of a node, as shown to the user.
///
/// `Idle` until the node is first submitted; afterwards it mirrors the
/// status of the node's latest [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeRunState {
    /// Never submitted, or the last submission was rejected.
    #[default]
    Idle,
    /// Waiting for a worker.
    Queued,
    /// Being generated.
    Processing,
    /// Finished with a result.
    Completed,
    /// Finished without a result.
    Failed,
}

impl From<RunStatus> for NodeRunState {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Queued => Self::Queued,
            RunStatus::Processing => Self::Processing,
            RunStatus::Completed => Self::Completed,
            RunStatus::Failed => Self::Failed,
        }
    }
}

/// One execution attempt of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Run id issued by the job service.
    pub id: RunId,
    /// Owning node.
    pub node_id: NodeId,
    /// Latest known status.
    pub status: RunStatus,
    /// Result asset, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    /// Failure reason, once failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the run was accepted.
    pub created_at: Timestamp,
    /// When the status last changed.
    pub updated_at: Timestamp,
}

impl Run {
    /// Creates a run record for a freshly accepted job.
    pub fn new(id: RunId, node_id: NodeId, status: RunStatus) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            node_id,
            status,
            asset_url: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the node state this run implies.
    #[inline]
    pub fn state(&self) -> NodeRunState {
        self.status.into()
    }

    /// Returns whether the run has finished.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a status report. Returns whether the status changed.
    ///
    /// Terminal runs ignore further reports.
    pub(crate) fn apply(&mut self, report: &JobStatusReport) -> bool {
        if self.is_terminal() || self.status == report.status {
            return false;
        }

        self.status = report.status;
        match report.status {
            RunStatus::Completed => self.asset_url = report.asset_url.clone(),
            RunStatus::Failed => {
                self.error = Some(
                    report
                        .error
                        .clone()
                        .unwrap_or_else(|| "job failed without a reason".to_owned()),
                );
            }
            RunStatus::Queued | RunStatus::Processing => {}
        }
        self.updated_at = Timestamp::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued() -> Run {
        Run::new(RunId::from("run-1"), NodeId::new(), RunStatus::Queued)
    }

    #[test]
    fn test_apply_transitions() {
        let mut run = queued();
        assert_eq!(run.state(), NodeRunState::Queued);

        assert!(run.apply(&JobStatusReport::pending(RunStatus::Processing)));
        assert!(!run.apply(&JobStatusReport::pending(RunStatus::Processing)));
        assert!(run.apply(&JobStatusReport::completed("https://cdn/out.mp4")));

        assert_eq!(run.state(), NodeRunState::Completed);
        assert_eq!(run.asset_url.as_deref(), Some("https://cdn/out.mp4"));
        assert!(run.error.is_none());
    }

    #[test]
    fn test_terminal_runs_are_frozen() {
        let mut run = queued();
        run.apply(&JobStatusReport::failed("nsfw filter"));
        assert!(!run.apply(&JobStatusReport::completed("late")));
        assert!(!run.apply(&JobStatusReport::failed("again")));

        assert_eq!(run.error.as_deref(), Some("nsfw filter"));
        assert!(run.asset_url.is_none());
    }

    #[test]
    fn test_failure_without_reason_gets_one() {
        let mut run = queued();
        let report = JobStatusReport::pending(RunStatus::Failed);
        assert!(run.apply(&report));
        assert!(run.error.is_some());
    }

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(NodeRunState::default(), NodeRunState::Idle);
        assert_eq!(NodeRunState::from(RunStatus::Processing).to_string(), "processing");
    }
}
