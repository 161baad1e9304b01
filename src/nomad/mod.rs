// ABOUTME: Orchestration API surface: job model, capability traits, HTTP client.
// ABOUTME: The pipeline depends only on the traits; NomadClient implements them.

mod api;
mod client;
mod error;
mod job;
mod models;

pub use api::{
    ConnectTarget, Connector, DeploymentsApi, EvaluationsApi, JobsApi, OrchestrationApi,
};
pub use client::{DEFAULT_ADDRESS, NomadClient, NomadConnector};
pub use error::ApiError;
pub use job::{
    Constraint, JOB_TYPE_SERVICE, Job, JobParseError, META_DC_REGION, META_HOST_GROUP, META_NODE,
    Resources, Task, TaskGroup,
};
pub use models::{
    Allocation, Deployment, DeploymentStatus, EVAL_STATUS_CANCELED, EVAL_STATUS_COMPLETE,
    EVAL_STATUS_FAILED, Evaluation, PlanResponse, QueryMeta, QueryOptions, RegisterResponse,
    TaskEvent, TaskState, ValidateResponse,
};
