// ABOUTME: Failure diagnostics gathered from a failed deployment's allocations.
// ABOUTME: Collects task event errors so a failure can be read without re-querying.

use crate::nomad::{Allocation, DeploymentsApi};
use crate::types::DeploymentId;
use std::fmt;

/// One task-level error reported by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    pub allocation: String,
    pub task: String,
    pub message: String,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.allocation, self.task, self.message)
    }
}

/// Task errors across every allocation of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<TaskError>,
}

impl Diagnostics {
    /// Walk allocation → task state → event and keep every non-empty
    /// driver, download, validation, setup, or vault error.
    pub fn from_allocations(allocations: &[Allocation]) -> Self {
        let errors = allocations
            .iter()
            .flat_map(|alloc| {
                alloc.task_states.iter().flat_map(move |(task, state)| {
                    state.events.iter().flat_map(move |event| {
                        event.errors().map(move |message| TaskError {
                            allocation: alloc.id.short().to_string(),
                            task: task.clone(),
                            message: message.to_string(),
                        })
                    })
                })
            })
            .collect();
        Self { errors }
    }

    /// Fetch a deployment's allocations and collect their task errors.
    ///
    /// A failed fetch yields empty diagnostics: the caller is already
    /// reporting a failure and the extra detail is best effort.
    pub async fn gather<A: DeploymentsApi + ?Sized>(api: &A, deployment: &DeploymentId) -> Self {
        match api.deployment_allocations(deployment).await {
            Ok(allocations) => Self::from_allocations(&allocations),
            Err(e) => {
                tracing::warn!(deployment = %deployment.short(), "failed to fetch allocations: {}", e);
                Self::default()
            }
        }
    }

    pub fn errors(&self) -> &[TaskError] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Rendered messages, one per task error.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}
