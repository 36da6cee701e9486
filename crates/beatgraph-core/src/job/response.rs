//! Job service responses.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::RunId;

/// Status of a run as reported by the job service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// Accepted, waiting for a worker.
    Queued,
    /// A worker is generating the result.
    Processing,
    /// Finished with a result asset.
    Completed,
    /// Finished without a result.
    Failed,
}

impl RunStatus {
    /// Returns whether no further transitions can happen.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Acknowledgement of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    /// Run id issued by the service.
    pub run_id: RunId,
    /// Initial status, normally `queued`.
    pub status: RunStatus,
}

impl JobAccepted {
    /// Creates a queued acknowledgement.
    pub fn queued(run_id: impl Into<RunId>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Queued,
        }
    }
}

/// Result of a status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusReport {
    /// Current status.
    pub status: RunStatus,
    /// Result asset, present once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    /// Failure reason, present once failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusReport {
    /// Creates a report for a non-terminal status.
    pub fn pending(status: RunStatus) -> Self {
        Self {
            status,
            asset_url: None,
            error: None,
        }
    }

    /// Creates a completed report.
    pub fn completed(asset_url: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Completed,
            asset_url: Some(asset_url.into()),
            error: None,
        }
    }

    /// Creates a failed report.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            asset_url: None,
            error: Some(error.into()),
        }
    }
}
