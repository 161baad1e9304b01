// ABOUTME: Pipeline error types with SNAFU pattern.
// ABOUTME: One variant per failure point, classified by DeployErrorKind.

use super::stage::Stage;
use crate::nomad::{ApiError, JobParseError};
use crate::types::{DeploymentId, EvalId, ServiceName};
use snafu::Snafu;
use std::path::PathBuf;
use std::time::Duration;

/// Failure of one pipeline stage.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DeployError {
    #[snafu(display("no job file for {service} (searched {})", render_paths(searched)))]
    JobFileNotFound {
        service: ServiceName,
        searched: Vec<PathBuf>,
    },

    #[snafu(display("failed to read job file {}: {source}", path.display()))]
    JobFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to parse job file {}: {source}", path.display()))]
    JobFileParse {
        path: PathBuf,
        source: JobParseError,
    },

    #[snafu(display("service {service} is not configured for datacenter {dc}"))]
    ServiceNotConfigured { service: ServiceName, dc: String },

    #[snafu(display("failed to connect to {address}: {source}"))]
    Connect { address: String, source: ApiError },

    #[snafu(display("invalid {service} override: {message}"))]
    InvalidOverride {
        service: ServiceName,
        message: String,
    },

    #[snafu(display("job validation failed: {source}"))]
    Validate { source: ApiError },

    #[snafu(display("job rejected: {}", problems.join("; ")))]
    Rejected { problems: Vec<String> },

    #[snafu(display("job plan failed: {source}"))]
    Plan { source: ApiError },

    #[snafu(display("job registration failed: {source}"))]
    Register { source: ApiError },

    #[snafu(display("evaluation {eval_id} lookup failed: {source}"))]
    EvaluationLookup { eval_id: EvalId, source: ApiError },

    #[snafu(display("evaluation {eval_id} {status}: {description}"))]
    EvaluationAborted {
        eval_id: EvalId,
        status: String,
        description: String,
    },

    #[snafu(display(
        "evaluation {eval_id} created no deployment within {}",
        format_secs(*waited)
    ))]
    EvaluationTimeout { eval_id: EvalId, waited: Duration },

    #[snafu(display("deployment {deployment_id} lookup failed: {source}"))]
    DeploymentLookup {
        deployment_id: DeploymentId,
        source: ApiError,
    },

    #[snafu(display(
        "deployment failed status: {status} {description}{}",
        render_diagnostics(diagnostics)
    ))]
    DeploymentFailed {
        status: String,
        description: String,
        diagnostics: Vec<String>,
    },

    #[snafu(display(
        "deployment {deployment_id} still {status} after {}",
        format_secs(*waited)
    ))]
    DeploymentTimeout {
        deployment_id: DeploymentId,
        status: String,
        waited: Duration,
    },

    #[snafu(display("{stage} cancelled"))]
    Cancelled { stage: Stage },

    #[snafu(display("{stage} cannot run before {requires}"))]
    OutOfOrder { stage: Stage, requires: Stage },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// A file existed but could not be read or parsed.
    ConfigLoad,
    /// The job file or the service's datacenter entry is missing.
    ConfigNotFound,
    /// The scheduler could not be reached.
    Connection,
    /// The merged job was rejected locally or by the scheduler.
    Validation,
    Plan,
    Register,
    /// The rollout ended in a non-successful state or overran its bound.
    Deployment,
    Cancelled,
    /// A stage was driven before its prerequisites.
    OutOfOrder,
}

impl DeployError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::JobFileNotFound { .. } | DeployError::ServiceNotConfigured { .. } => {
                DeployErrorKind::ConfigNotFound
            }
            DeployError::JobFileRead { .. } | DeployError::JobFileParse { .. } => {
                DeployErrorKind::ConfigLoad
            }
            DeployError::Connect { .. } => DeployErrorKind::Connection,
            DeployError::InvalidOverride { .. }
            | DeployError::Validate { .. }
            | DeployError::Rejected { .. } => DeployErrorKind::Validation,
            DeployError::Plan { .. } => DeployErrorKind::Plan,
            DeployError::Register { .. }
            | DeployError::EvaluationLookup { .. }
            | DeployError::EvaluationAborted { .. }
            | DeployError::EvaluationTimeout { .. } => DeployErrorKind::Register,
            DeployError::DeploymentLookup { .. }
            | DeployError::DeploymentFailed { .. }
            | DeployError::DeploymentTimeout { .. } => DeployErrorKind::Deployment,
            DeployError::Cancelled { .. } => DeployErrorKind::Cancelled,
            DeployError::OutOfOrder { .. } => DeployErrorKind::OutOfOrder,
        }
    }

    /// Task errors collected from a failed deployment's allocations.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            DeployError::DeploymentFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }

    /// The scheduler error underneath, if this failure came from an API call.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            DeployError::Connect { source, .. }
            | DeployError::Validate { source }
            | DeployError::Plan { source }
            | DeployError::Register { source }
            | DeployError::EvaluationLookup { source, .. }
            | DeployError::DeploymentLookup { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Seconds with one decimal, e.g. `12.5s`.
pub fn format_secs(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

fn render_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_diagnostics(diagnostics: &[String]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    let mut out = String::from("\ntask errors:");
    for line in diagnostics {
        out.push_str("\n  ");
        out.push_str(line);
    }
    out
}
