// ABOUTME: Capability traits for the scheduler API consumed by the pipeline.
// ABOUTME: Defines JobsApi, EvaluationsApi, DeploymentsApi, and the Connector seam.

use super::error::ApiError;
use super::job::Job;
use super::models::{
    Allocation, Deployment, Evaluation, PlanResponse, QueryMeta, QueryOptions, RegisterResponse,
    ValidateResponse,
};
use crate::types::{DeploymentId, EvalId};
use async_trait::async_trait;

/// Job submission operations.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Check a job for syntax and semantic errors without touching the cluster.
    async fn validate_job(&self, job: &Job) -> Result<ValidateResponse, ApiError>;

    /// Dry-run the job and report the modify index it would apply against.
    async fn plan_job(&self, job: &Job) -> Result<PlanResponse, ApiError>;

    /// Register the job only if the scheduler's current modify index for it
    /// equals `modify_index`. An index of zero registers only a new job.
    async fn enforce_register_job(
        &self,
        job: &Job,
        modify_index: u64,
    ) -> Result<RegisterResponse, ApiError>;
}

/// Evaluation lookups.
#[async_trait]
pub trait EvaluationsApi: Send + Sync {
    async fn evaluation(&self, id: &EvalId) -> Result<Evaluation, ApiError>;
}

/// Deployment lookups.
#[async_trait]
pub trait DeploymentsApi: Send + Sync {
    /// Blocking query for a deployment.
    async fn deployment(
        &self,
        id: &DeploymentId,
        query: &QueryOptions,
    ) -> Result<(Deployment, QueryMeta), ApiError>;

    /// Allocations placed by a deployment.
    async fn deployment_allocations(&self, id: &DeploymentId)
    -> Result<Vec<Allocation>, ApiError>;
}

/// Everything the deployment pipeline needs from a scheduler.
///
/// Automatically implemented for any type that implements all capability traits.
pub trait OrchestrationApi: JobsApi + EvaluationsApi + DeploymentsApi {}

impl<T> OrchestrationApi for T where T: JobsApi + EvaluationsApi + DeploymentsApi {}

/// Where to connect: the scheduler region and a bootstrap address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub region: String,
    pub address: String,
}

/// Opens a verified connection to a scheduler.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: OrchestrationApi;

    async fn connect(&self, target: &ConnectTarget) -> Result<Self::Client, ApiError>;
}
