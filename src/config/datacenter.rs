// ABOUTME: One datacenter's configuration: region, dc id, and its services.
// ABOUTME: Parsed from <root>/datacenters/<dc>/<profile>.yml.

use super::deserialize::deserialize_services;
use super::{PollSettings, ServiceConfig};
use crate::error::{Error, Result};
use crate::types::ServiceName;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatacenterConfig {
    #[serde(default = "default_region")]
    pub region: String,

    /// Datacenter identifier as the scheduler knows it. Defaults to the name of
    /// the directory the file was loaded from.
    #[serde(default)]
    pub dc: String,

    #[serde(default)]
    pub polling: PollSettings,

    #[serde(default, deserialize_with = "deserialize_services")]
    pub services: BTreeMap<ServiceName, ServiceConfig>,
}

fn default_region() -> String {
    "global".to_string()
}

impl DatacenterConfig {
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty document is a datacenter with every default.
        if yaml.trim().is_empty() {
            return serde_yaml::from_str("{}");
        }
        serde_yaml::from_str(yaml)
    }

    /// Load a datacenter file, using `name` when the file does not set `dc`.
    pub fn load(path: &Path, name: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::config_load(path, e))?;
        let mut config = Self::from_yaml(&content).map_err(|e| Error::config_load(path, e))?;
        if config.dc.is_empty() {
            config.dc = name.to_string();
        }
        Ok(config)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }
}
