// ABOUTME: Single-call stages against the scheduler: validate, plan, register.
// ABOUTME: Free functions over the capability traits so they run against any API.

use super::error::{DeployError, PlanSnafu, RegisterSnafu, RejectedSnafu, ValidateSnafu};
use crate::nomad::{Job, JobsApi};
use crate::types::EvalId;
use snafu::ResultExt;

/// Ask the scheduler to validate `job`.
///
/// # Errors
///
/// Fails on a transport error and when the scheduler reports any problem.
pub async fn validate_job<A: JobsApi + ?Sized>(api: &A, job: &Job) -> Result<(), DeployError> {
    let response = api.validate_job(job).await.context(ValidateSnafu)?;

    let problems = response.problems();
    if !problems.is_empty() {
        return RejectedSnafu { problems }.fail();
    }
    if !response.warnings.is_empty() {
        tracing::warn!(job = ?job.id(), "validation warnings: {}", response.warnings);
    }

    tracing::info!(job = ?job.id(), "job validated");
    Ok(())
}

/// Dry-run `job` and return the modify index registration must match.
pub async fn plan_job<A: JobsApi + ?Sized>(api: &A, job: &Job) -> Result<u64, DeployError> {
    let response = api.plan_job(job).await.context(PlanSnafu)?;
    if !response.warnings.is_empty() {
        tracing::warn!(job = ?job.id(), "plan warnings: {}", response.warnings);
    }

    tracing::info!(job = ?job.id(), modify_index = response.job_modify_index, "job planned");
    Ok(response.job_modify_index)
}

/// Register `job`, enforcing `modify_index` so a concurrent change to the job
/// since planning makes registration fail.
///
/// Returns the evaluation created, or `None` for jobs that create none
/// (periodic and parameterized jobs).
pub async fn register_job<A: JobsApi + ?Sized>(
    api: &A,
    job: &Job,
    modify_index: u64,
) -> Result<Option<EvalId>, DeployError> {
    let response = api
        .enforce_register_job(job, modify_index)
        .await
        .context(RegisterSnafu)?;
    if !response.warnings.is_empty() {
        tracing::warn!(job = ?job.id(), "register warnings: {}", response.warnings);
    }

    let eval_id = response.eval_id();
    match &eval_id {
        Some(id) => tracing::info!(job = ?job.id(), eval = %id.short(), "job registered"),
        None => tracing::info!(job = ?job.id(), "job registered without an evaluation"),
    }
    Ok(eval_id)
}
