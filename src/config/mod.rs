// ABOUTME: Layered deployment configuration: datacenters × services.
// ABOUTME: Discovers and parses every datacenter file for one profile under a root.

mod datacenter;
mod deserialize;
mod polling;
mod resolve;
mod service;

pub use datacenter::DatacenterConfig;
pub use polling::PollSettings;
pub use service::ServiceConfig;

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Directory under the root holding one subdirectory per datacenter.
pub const DATACENTERS_DIR: &str = "datacenters";
pub const CONFIG_EXTENSION: &str = "yml";

/// Every datacenter's configuration for one profile, plus the federation.
///
/// Layout under `root`:
///
/// ```text
/// datacenters/<profile>.yml          federation descriptor (optional)
/// datacenters/<dc>/<profile>.yml     one per datacenter
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentConfig {
    /// Space-delimited datacenter names queried together.
    pub federated_dcs: String,
    pub datacenters: BTreeMap<String, DatacenterConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FederationFile {
    #[serde(default)]
    federated_dcs: String,
}

impl DeploymentConfig {
    /// Load every datacenter configured for `profile`.
    ///
    /// Loading is all-or-nothing: one malformed datacenter file fails the whole
    /// load, so a returned config never holds a partial set of datacenters.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigLoad` for an unreadable or malformed file and
    /// `Error::ConfigNotFound` when no datacenter has a file for `profile`.
    pub fn load(root: &Path, profile: &str) -> Result<Self> {
        if profile.is_empty() || profile.contains(['/', '\\']) || profile.starts_with('.') {
            return Err(Error::InvalidArgument(format!("invalid profile name: '{profile}'")));
        }

        let dir = root.join(DATACENTERS_DIR);
        let file_name = format!("{profile}.{CONFIG_EXTENSION}");

        let entries = std::fs::read_dir(&dir).map_err(|e| Error::config_load(&dir, e))?;
        let mut datacenters = BTreeMap::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::config_load(&dir, e))?;
            let source = entry.path().join(&file_name);
            if !entry.path().is_dir() || !source.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let config = DatacenterConfig::load(&source, &name)?;
            tracing::debug!(dc = %name, services = config.services.len(), "loaded datacenter");
            datacenters.insert(name, config);
        }

        if datacenters.is_empty() {
            return Err(Error::ConfigNotFound {
                root: root.to_path_buf(),
                profile: profile.to_string(),
            });
        }

        let federated_dcs = Self::load_federation(&dir.join(&file_name))?;

        Ok(Self {
            federated_dcs,
            datacenters,
        })
    }

    fn load_federation(path: &Path) -> Result<String> {
        if !path.is_file() {
            return Ok(String::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::config_load(path, e))?;
        if content.trim().is_empty() {
            return Ok(String::new());
        }

        let file: FederationFile =
            serde_yaml::from_str(&content).map_err(|e| Error::config_load(path, e))?;
        Ok(file.federated_dcs)
    }
}
