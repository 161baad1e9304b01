// ABOUTME: Request options and response shapes of the scheduler API.
// ABOUTME: Evaluations, deployments, allocations, and blocking-query metadata.

use crate::types::{AllocationId, DeploymentId, EvalId};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Evaluation status reported once scheduling work has finished.
pub const EVAL_STATUS_COMPLETE: &str = "complete";
pub const EVAL_STATUS_FAILED: &str = "failed";
pub const EVAL_STATUS_CANCELED: &str = "canceled";

/// Blocking-query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Return as soon as the object's index exceeds this value.
    pub wait_index: u64,
    /// Upper bound the server holds the request open.
    pub wait_time: Duration,
    /// Allow any server, not only the leader, to answer.
    pub allow_stale: bool,
}

impl QueryOptions {
    /// First round of a long-poll: index 1 answers immediately.
    pub fn blocking(wait_time: Duration) -> Self {
        Self {
            wait_index: 1,
            wait_time,
            allow_stale: true,
        }
    }
}

/// Metadata returned with every query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryMeta {
    /// Raft index of the returned data (`X-Nomad-Index`).
    pub last_index: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateResponse {
    #[serde(rename = "ValidationErrors", default, deserialize_with = "null_default")]
    pub validation_errors: Vec<String>,
    #[serde(rename = "Error", default, deserialize_with = "null_default")]
    pub error: String,
    #[serde(rename = "Warnings", default, deserialize_with = "null_default")]
    pub warnings: String,
}

impl ValidateResponse {
    /// All problems reported by the scheduler.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = self.validation_errors.clone();
        if !self.error.is_empty() && !problems.contains(&self.error) {
            problems.push(self.error.clone());
        }
        problems
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanResponse {
    #[serde(rename = "JobModifyIndex", default)]
    pub job_modify_index: u64,
    #[serde(rename = "Warnings", default, deserialize_with = "null_default")]
    pub warnings: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    /// Empty for periodic and parameterized jobs, which create no evaluation.
    #[serde(rename = "EvalID", default, deserialize_with = "null_default")]
    pub eval_id: String,
    #[serde(rename = "JobModifyIndex", default)]
    pub job_modify_index: u64,
    #[serde(rename = "Warnings", default, deserialize_with = "null_default")]
    pub warnings: String,
}

impl RegisterResponse {
    pub fn eval_id(&self) -> Option<EvalId> {
        EvalId::from_field(&self.eval_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Evaluation {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Status", default)]
    pub status: String,
    #[serde(rename = "StatusDescription", default, deserialize_with = "null_default")]
    pub status_description: String,
    /// Type of the evaluated job.
    #[serde(rename = "Type", default)]
    pub job_type: String,
    #[serde(rename = "DeploymentID", default, deserialize_with = "null_default")]
    pub deployment_id: String,
}

impl Evaluation {
    pub fn deployment_id(&self) -> Option<DeploymentId> {
        DeploymentId::from_field(&self.deployment_id)
    }

    pub fn is_complete(&self) -> bool {
        self.status == EVAL_STATUS_COMPLETE
    }

    /// Ended without scheduling anything.
    pub fn is_aborted(&self) -> bool {
        self.status == EVAL_STATUS_FAILED || self.status == EVAL_STATUS_CANCELED
    }
}

/// Lifecycle of a scheduler deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    Pending,
    Initializing,
    Running,
    Paused,
    Blocked,
    Unblocking,
    Successful,
    Failed,
    Cancelled,
    Other(String),
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Initializing => "initializing",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Paused => "paused",
            DeploymentStatus::Blocked => "blocked",
            DeploymentStatus::Unblocking => "unblocking",
            DeploymentStatus::Successful => "successful",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Cancelled => "cancelled",
            DeploymentStatus::Other(s) => s,
        }
    }

    /// Still rolling out; keep watching.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Pending
                | DeploymentStatus::Initializing
                | DeploymentStatus::Running
                | DeploymentStatus::Paused
                | DeploymentStatus::Blocked
                | DeploymentStatus::Unblocking
        )
    }
}

impl From<&str> for DeploymentStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => DeploymentStatus::Pending,
            "initializing" => DeploymentStatus::Initializing,
            "running" => DeploymentStatus::Running,
            "paused" => DeploymentStatus::Paused,
            "blocked" => DeploymentStatus::Blocked,
            "unblocking" => DeploymentStatus::Unblocking,
            "successful" => DeploymentStatus::Successful,
            "failed" => DeploymentStatus::Failed,
            "cancelled" => DeploymentStatus::Cancelled,
            other => DeploymentStatus::Other(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for DeploymentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| DeploymentStatus::from(s.as_str()))
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    #[serde(rename = "ID")]
    pub id: DeploymentId,
    #[serde(rename = "Status")]
    pub status: DeploymentStatus,
    #[serde(rename = "StatusDescription", default, deserialize_with = "null_default")]
    pub status_description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Allocation {
    #[serde(rename = "ID")]
    pub id: AllocationId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "TaskStates", default, deserialize_with = "null_default")]
    pub task_states: BTreeMap<String, TaskState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskState {
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "Failed", default)]
    pub failed: bool,
    #[serde(rename = "Events", default, deserialize_with = "null_default")]
    pub events: Vec<TaskEvent>,
}

/// One entry in a task's event history. Error fields are empty unless that
/// phase failed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskEvent {
    #[serde(rename = "Type", default)]
    pub event_type: String,
    #[serde(rename = "DriverError", default)]
    pub driver_error: String,
    #[serde(rename = "DownloadError", default)]
    pub download_error: String,
    #[serde(rename = "ValidationError", default)]
    pub validation_error: String,
    #[serde(rename = "SetupError", default)]
    pub setup_error: String,
    #[serde(rename = "VaultError", default)]
    pub vault_error: String,
}

impl TaskEvent {
    /// Non-empty error messages, in driver, download, validation, setup,
    /// vault order.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        [
            &self.driver_error,
            &self.download_error,
            &self.validation_error,
            &self.setup_error,
            &self.vault_error,
        ]
        .into_iter()
        .map(String::as_str)
        .filter(|e| !e.is_empty())
    }
}

/// The API writes `null` for empty collections and strings.
pub(super) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
