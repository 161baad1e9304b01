// ABOUTME: Locates and parses a service's job file under the config root.
// ABOUTME: Looks in nomad/service first, then nomad/system.

use super::error::{DeployError, JobFileNotFoundSnafu, JobFileParseSnafu, JobFileReadSnafu};
use crate::nomad::Job;
use crate::types::ServiceName;
use snafu::ResultExt;
use std::path::{Path, PathBuf};

/// Directory under the root holding job files.
pub const JOBS_DIR: &str = "nomad";

/// Job sets in lookup order.
pub const JOB_SETS: [&str; 2] = ["service", "system"];

const JOB_EXTENSIONS: [&str; 3] = ["json", "yml", "yaml"];

/// Every path a job file for `service` may live at, in lookup order.
pub fn job_file_candidates(root: &Path, service: &ServiceName) -> Vec<PathBuf> {
    JOB_SETS
        .iter()
        .flat_map(|set| {
            let dir = root.join(JOBS_DIR).join(set);
            JOB_EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("{service}.{ext}")))
        })
        .collect()
}

/// First existing job file for `service`.
pub fn locate_job_file(root: &Path, service: &ServiceName) -> Result<PathBuf, DeployError> {
    let candidates = job_file_candidates(root, service);
    match candidates.iter().find(|p| p.is_file()) {
        Some(path) => Ok(path.clone()),
        None => JobFileNotFoundSnafu {
            service: service.clone(),
            searched: candidates,
        }
        .fail(),
    }
}

/// Locate and parse the job file for `service`.
///
/// A job without an `ID` is given its `Name`, or failing that the service name.
pub fn load_job(root: &Path, service: &ServiceName) -> Result<(Job, PathBuf), DeployError> {
    let path = locate_job_file(root, service)?;
    let content = std::fs::read_to_string(&path).context(JobFileReadSnafu { path: &path })?;
    let mut job = Job::from_document(&content).context(JobFileParseSnafu { path: &path })?;

    if job.id.is_none() {
        job.id = Some(
            job.name
                .clone()
                .unwrap_or_else(|| service.as_str().to_string()),
        );
    }

    tracing::debug!(path = %path.display(), job = ?job.id, "loaded job file");
    Ok((job, path))
}
