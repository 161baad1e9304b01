// ABOUTME: Application-wide error types for pitwall.
// ABOUTME: Uses thiserror for config loading and wraps pipeline failures.

use crate::deploy::DeployError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no datacenter configuration for profile '{profile}' under {}", root.display())]
    ConfigNotFound { root: PathBuf, profile: String },

    #[error("failed to load {}: {reason}", path.display())]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("unknown datacenter: {0}")]
    UnknownDatacenter(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

impl Error {
    pub(crate) fn config_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::ConfigLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
