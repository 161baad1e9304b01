// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles service maps, image refs, and positive resource values.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::ServiceConfig;
use crate::types::{ImageRef, ServiceName};

pub fn deserialize_image_ref_option<'de, D>(deserializer: D) -> Result<Option<ImageRef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.filter(|s| !s.trim().is_empty())
        .map(|s| ImageRef::parse(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_positive<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<u32>::deserialize(deserializer)? {
        Some(0) => Err(serde::de::Error::custom("value must be a positive integer")),
        other => Ok(other),
    }
}

/// A missing or null `services` key is an empty map; every key must be a
/// valid service name.
pub fn deserialize_services<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<ServiceName, ServiceConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<ServiceConfig>>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|(name, svc)| {
            ServiceName::new(&name)
                .map(|name| (name, svc.unwrap_or_default()))
                .map_err(|e| serde::de::Error::custom(format!("service '{name}': {e}")))
        })
        .collect()
}
