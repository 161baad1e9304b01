// ABOUTME: Per-datacenter runtime parameters for one service.
// ABOUTME: Image, instance count, placement, resources, env, args, and volumes.

use super::deserialize::{deserialize_image_ref_option, deserialize_positive};
use crate::types::ImageRef;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Desired runtime parameters of one service within one datacenter.
///
/// Every field is optional in the YAML source. Empty placement strings and a
/// zero `count` mean "keep what the job file says".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    /// Statically configured image. Replaced by the deployment image when the
    /// job is merged.
    #[serde(default, deserialize_with = "deserialize_image_ref_option")]
    pub image: Option<ImageRef>,

    #[serde(default)]
    pub count: u32,

    #[serde(default)]
    pub host_group: String,

    #[serde(default)]
    pub node: String,

    #[serde(default)]
    pub dc_region: String,

    /// CPU reservation in MHz.
    #[serde(default, deserialize_with = "deserialize_positive")]
    pub cpu: Option<u32>,

    /// Memory reservation in MB.
    #[serde(default, deserialize_with = "deserialize_positive")]
    pub memory: Option<u32>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Alternating flag/value pairs passed to the task.
    #[serde(default)]
    pub arguments: Vec<String>,

    /// `source:target` mounts.
    #[serde(default)]
    pub volumes: Vec<String>,
}

impl ServiceConfig {
    /// Instance count override, if one is configured.
    pub fn count_override(&self) -> Option<u32> {
        (self.count > 0).then_some(self.count)
    }

    /// Arguments grouped as `(flag, value)` pairs. A trailing flag without a
    /// value is yielded with `None`.
    pub fn argument_pairs(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.arguments
            .chunks(2)
            .map(|pair| (pair[0].as_str(), pair.get(1).map(String::as_str)))
    }
}
