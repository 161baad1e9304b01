// ABOUTME: The two polling loops: evaluation → deployment id, and deployment → terminal.
// ABOUTME: Both are bounded by PollSettings and stop early on cancellation.

use super::error::{
    CancelledSnafu, DeployError, DeploymentFailedSnafu, DeploymentLookupSnafu,
    DeploymentTimeoutSnafu, EvaluationAbortedSnafu, EvaluationLookupSnafu,
    EvaluationTimeoutSnafu, format_secs,
};
use super::stage::Stage;
use crate::config::PollSettings;
use crate::diagnostics::Diagnostics;
use crate::nomad::{DeploymentStatus, DeploymentsApi, EvaluationsApi, JOB_TYPE_SERVICE, QueryOptions};
use crate::types::{DeploymentId, EvalId};
use snafu::ResultExt;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Poll an evaluation until the scheduler attaches a deployment to it.
///
/// Returns `None` when the evaluation completes without one, which is how
/// batch and system jobs finish.
///
/// # Errors
///
/// Fails if the evaluation fails or is canceled, if no deployment appears
/// within `settings.evaluation_timeout`, and on cancellation.
pub async fn await_deployment_id<A: EvaluationsApi + ?Sized>(
    api: &A,
    eval_id: &EvalId,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<Option<DeploymentId>, DeployError> {
    let started = Instant::now();
    loop {
        let eval = tokio::select! {
            _ = cancel.cancelled() => return CancelledSnafu { stage: Stage::Register }.fail(),
            result = api.evaluation(eval_id) => result.context(EvaluationLookupSnafu {
                eval_id: eval_id.clone(),
            })?,
        };

        if let Some(deployment_id) = eval.deployment_id() {
            tracing::info!(eval = %eval_id.short(), deployment = %deployment_id.short(), "deployment created");
            return Ok(Some(deployment_id));
        }
        if eval.is_complete() && eval.job_type != JOB_TYPE_SERVICE {
            tracing::info!(eval = %eval_id.short(), job_type = %eval.job_type, "evaluation complete, no deployment");
            return Ok(None);
        }
        if eval.is_aborted() {
            return EvaluationAbortedSnafu {
                eval_id: eval_id.clone(),
                status: eval.status,
                description: eval.status_description,
            }
            .fail();
        }

        let waited = started.elapsed();
        if waited >= settings.evaluation_timeout {
            return EvaluationTimeoutSnafu {
                eval_id: eval_id.clone(),
                waited,
            }
            .fail();
        }

        tracing::debug!(eval = %eval_id.short(), status = %eval.status, "waiting for deployment");
        tokio::select! {
            _ = cancel.cancelled() => return CancelledSnafu { stage: Stage::Register }.fail(),
            _ = tokio::time::sleep(settings.evaluation_interval) => {}
        }
    }
}

/// Long-poll a deployment until it reaches a terminal state.
///
/// Each query blocks server-side until the deployment changes or
/// `settings.deployment_wait` passes; the wait index follows the index the
/// server reports. Returns the time spent watching on success.
///
/// # Errors
///
/// Any terminal status other than `successful` fails with the scheduler's
/// status, description, and the task errors found on the deployment's
/// allocations.
pub async fn watch_deployment<A: DeploymentsApi + ?Sized>(
    api: &A,
    deployment_id: &DeploymentId,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<Duration, DeployError> {
    let started = Instant::now();
    let mut query = QueryOptions::blocking(settings.deployment_wait);
    loop {
        let (deployment, meta) = tokio::select! {
            _ = cancel.cancelled() => return CancelledSnafu { stage: Stage::Status }.fail(),
            result = api.deployment(deployment_id, &query) => result.context(DeploymentLookupSnafu {
                deployment_id: deployment_id.clone(),
            })?,
        };
        // An index of 0 would turn the next query into a non-blocking one.
        query.wait_index = meta.last_index.max(1);

        let elapsed = started.elapsed();
        match deployment.status {
            DeploymentStatus::Successful => {
                tracing::info!(deployment = %deployment_id.short(), after = %format_secs(elapsed), "deployment successful");
                return Ok(elapsed);
            }
            status if status.is_in_progress() => {
                tracing::debug!(
                    deployment = %deployment_id.short(),
                    %status,
                    running = %format_secs(elapsed),
                    "checking deployment status"
                );
                if elapsed >= settings.deployment_timeout {
                    return DeploymentTimeoutSnafu {
                        deployment_id: deployment_id.clone(),
                        status: status.to_string(),
                        waited: elapsed,
                    }
                    .fail();
                }
            }
            status => {
                let diagnostics = Diagnostics::gather(api, deployment_id).await;
                for error in diagnostics.errors() {
                    tracing::warn!(deployment = %deployment_id.short(), "{}", error);
                }
                return DeploymentFailedSnafu {
                    status: status.to_string(),
                    description: deployment.status_description,
                    diagnostics: diagnostics.messages(),
                }
                .fail();
            }
        }
    }
}
