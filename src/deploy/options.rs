// ABOUTME: Invocation parameters of one deployment.
// ABOUTME: Built by the CLI and handed to the Deployer by value.

use crate::types::{ImageRef, ServiceName};
use std::path::PathBuf;

/// What to deploy, where, and through which scheduler address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    /// Configuration root holding `datacenters/` and `nomad/`.
    pub root: PathBuf,
    pub dc: String,
    pub service: ServiceName,
    /// Image written into the job and the resolved service config.
    pub image: ImageRef,
    /// Bootstrap address of the scheduler API.
    pub address: String,
}
