// ABOUTME: Merges a datacenter's service overrides into a job template.
// ABOUTME: Pure: returns a new job and a new service config, inputs are untouched.

use super::error::{DeployError, InvalidOverrideSnafu};
use crate::config::{DatacenterConfig, ServiceConfig};
use crate::nomad::{Constraint, Job, META_DC_REGION, META_HOST_GROUP, META_NODE, Task};
use crate::types::{ImageRef, ServiceName};
use serde_json::Value;

/// A job ready for submission and the service config it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedJob {
    pub job: Job,
    /// The resolved service config with the deployment image applied.
    pub service: ServiceConfig,
}

/// A parsed `source:target[:mode]` volume mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

impl VolumeMount {
    /// Parse `source:target`, `source:target:ro` or `source:target:rw`.
    pub fn parse(spec: &str) -> Option<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        let (source, target, read_only) = match parts.as_slice() {
            [source, target] => (*source, *target, false),
            [source, target, "ro"] => (*source, *target, true),
            [source, target, "rw"] => (*source, *target, false),
            _ => return None,
        };
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self {
            source: source.to_string(),
            target: target.to_string(),
            read_only,
        })
    }

    /// Docker driver form of the mount.
    pub fn to_driver_string(&self) -> String {
        if self.read_only {
            format!("{}:{}:ro", self.source, self.target)
        } else {
            format!("{}:{}", self.source, self.target)
        }
    }
}

/// Apply `service`'s overrides for `datacenter` onto a copy of `job`.
///
/// - `Region` becomes the datacenter's region and the datacenter is added to
///   `Datacenters`.
/// - Each non-empty placement field adds a job-level equality constraint.
/// - In the task group named after the service, `Count` is set when the
///   configured count is non-zero.
/// - In that group's task named after the service, the image, resources,
///   environment, arguments, and volumes are set.
///
/// # Errors
///
/// Returns `DeployError::InvalidOverride` for a malformed volume.
pub fn merge_job(
    job: &Job,
    datacenter: &DatacenterConfig,
    name: &ServiceName,
    service: &ServiceConfig,
    image: &ImageRef,
) -> Result<MergedJob, DeployError> {
    let volumes = service
        .volumes
        .iter()
        .map(|v| {
            VolumeMount::parse(v).ok_or_else(|| {
                InvalidOverrideSnafu {
                    service: name.clone(),
                    message: format!("volume '{v}' is not source:target[:ro|rw]"),
                }
                .build()
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut job = job.clone();
    job.region = Some(datacenter.region.clone());
    job.add_datacenter(&datacenter.dc);

    for (attribute, value) in [
        (META_DC_REGION, &service.dc_region),
        (META_HOST_GROUP, &service.host_group),
        (META_NODE, &service.node),
    ] {
        if !value.is_empty() {
            job.constrain(Constraint::equals(attribute, value));
        }
    }

    match job.task_group_mut(name.as_str()) {
        Some(group) => {
            if let Some(count) = service.count_override() {
                group.count = Some(count);
            }
            match group.task_mut(name.as_str()) {
                Some(task) => apply_task_overrides(task, service, image, &volumes),
                None => tracing::warn!(service = %name, "task group has no task named after the service"),
            }
        }
        None => tracing::warn!(service = %name, "job has no task group named after the service"),
    }

    let mut service = service.clone();
    service.image = Some(image.clone());

    Ok(MergedJob { job, service })
}

fn apply_task_overrides(
    task: &mut Task,
    service: &ServiceConfig,
    image: &ImageRef,
    volumes: &[VolumeMount],
) {
    task.config
        .insert("image".to_string(), Value::String(image.to_string()));

    if service.cpu.is_some() || service.memory.is_some() {
        let resources = task.resources.get_or_insert_with(Default::default);
        if let Some(cpu) = service.cpu {
            resources.cpu = Some(cpu);
        }
        if let Some(memory) = service.memory {
            resources.memory_mb = Some(memory);
        }
    }

    if !service.environment.is_empty() {
        task.env
            .get_or_insert_with(Default::default)
            .extend(service.environment.clone());
    }

    if !service.arguments.is_empty() {
        task.config
            .insert("args".to_string(), string_array(service.arguments.iter().cloned()));
    }

    if !volumes.is_empty() {
        task.config.insert(
            "volumes".to_string(),
            string_array(volumes.iter().map(VolumeMount::to_driver_string)),
        );
    }
}

fn string_array(items: impl Iterator<Item = String>) -> Value {
    Value::Array(items.map(Value::String).collect())
}
