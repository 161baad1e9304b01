// ABOUTME: In-memory job descriptor in the scheduler's JSON job format.
// ABOUTME: Models the fields pitwall edits and carries everything else through untouched.

use super::models::null_default;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const JOB_TYPE_SERVICE: &str = "service";

/// Placement attribute keys matched against client node metadata.
pub const META_DC_REGION: &str = "${meta.dc_region}";
pub const META_HOST_GROUP: &str = "${meta.hostgroup}";
pub const META_NODE: &str = "${meta.node}";

/// A scheduler job.
///
/// Only the fields that the merge step reads or writes are typed. Any other
/// key in the job file lands in `extra` and is sent back verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    #[serde(rename = "Region", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(rename = "Datacenters", default, deserialize_with = "null_default")]
    pub datacenters: Vec<String>,

    #[serde(
        rename = "Constraints",
        default,
        deserialize_with = "null_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub constraints: Vec<Constraint>,

    #[serde(rename = "TaskGroups", default, deserialize_with = "null_default")]
    pub task_groups: Vec<TaskGroup>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskGroup {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    #[serde(rename = "Tasks", default, deserialize_with = "null_default")]
    pub tasks: Vec<Task>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Driver", default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// Driver configuration, e.g. `image`, `args`, `volumes` for docker.
    #[serde(rename = "Config", default, deserialize_with = "null_default")]
    pub config: Map<String, Value>,

    #[serde(rename = "Env", default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,

    #[serde(rename = "Resources", default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(rename = "CPU", default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,

    #[serde(rename = "MemoryMB", default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "LTarget")]
    pub l_target: String,
    #[serde(rename = "RTarget")]
    pub r_target: String,
    #[serde(rename = "Operand")]
    pub operand: String,
}

impl Constraint {
    /// An equality constraint: `attribute = value`.
    pub fn equals(attribute: &str, value: &str) -> Self {
        Self {
            l_target: attribute.to_string(),
            r_target: value.to_string(),
            operand: "=".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobParseError {
    #[error("invalid JSON job: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML job: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid job: {0}")]
    Job(#[source] serde_json::Error),
}

impl Job {
    /// Parse a job document: JSON when it starts with `{`, YAML otherwise.
    ///
    /// The document is either `{"Job": {...}}` (what `nomad job run -output`
    /// prints) or the bare job object. A top-level `Job` key always means the
    /// wrapped form.
    pub fn from_document(content: &str) -> Result<Self, JobParseError> {
        let doc: Value = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)?
        } else {
            serde_yaml::from_str(content)?
        };
        let job = match doc {
            Value::Object(mut map) => match map.remove("Job") {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };
        serde_json::from_value(job).map_err(JobParseError::Job)
    }

    /// Job ID used in API paths: `ID`, falling back to `Name`.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }

    /// Scheduler type; jobs without one are service jobs.
    pub fn job_type(&self) -> &str {
        self.job_type.as_deref().unwrap_or(JOB_TYPE_SERVICE)
    }

    pub fn add_datacenter(&mut self, dc: &str) {
        if !self.datacenters.iter().any(|d| d == dc) {
            self.datacenters.push(dc.to_string());
        }
    }

    pub fn constrain(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn task_group_mut(&mut self, name: &str) -> Option<&mut TaskGroup> {
        self.task_groups.iter_mut().find(|tg| tg.name == name)
    }

    pub fn task_group(&self, name: &str) -> Option<&TaskGroup> {
        self.task_groups.iter().find(|tg| tg.name == name)
    }
}

impl TaskGroup {
    pub fn task_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.name == name)
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

impl Task {
    /// The `image` driver option, if set to a string.
    pub fn image(&self) -> Option<&str> {
        self.config.get("image").and_then(Value::as_str)
    }
}
