// ABOUTME: Deployment pipeline: job file, merge, submission, and rollout watch.
// ABOUTME: The Deployer runs the stages; each stage's logic is a free function.

mod deployer;
mod error;
mod job_file;
mod merge;
mod options;
mod poll;
mod stage;
mod submit;

pub use deployer::{DeploySummary, Deployer, RunState};
pub use error::{DeployError, DeployErrorKind, format_secs};
pub use job_file::{JOB_SETS, JOBS_DIR, job_file_candidates, load_job, locate_job_file};
pub use merge::{MergedJob, VolumeMount, merge_job};
pub use options::DeployOptions;
pub use poll::{await_deployment_id, watch_deployment};
pub use stage::Stage;
pub use submit::{plan_job, register_job, validate_job};
