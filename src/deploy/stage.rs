// ABOUTME: The ordered stages of a deployment.
// ABOUTME: Stage::ALL is the only order the Deployer runs them in.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Read the job file and check the service is configured.
    LoadConfig,
    /// Reach the scheduler.
    Connect,
    /// Merge overrides into the job and validate it.
    Validate,
    /// Dry-run the job and capture its modify index.
    Plan,
    /// Register the job and wait for its deployment to be created.
    Register,
    /// Watch the deployment until it finishes.
    Status,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::LoadConfig,
        Stage::Connect,
        Stage::Validate,
        Stage::Plan,
        Stage::Register,
        Stage::Status,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::LoadConfig => "load-config",
            Stage::Connect => "connect",
            Stage::Validate => "validate",
            Stage::Plan => "plan",
            Stage::Register => "register",
            Stage::Status => "status",
        }
    }

    /// Progress line shown while the stage runs.
    pub fn description(&self) -> &'static str {
        match self {
            Stage::LoadConfig => "Loading job file",
            Stage::Connect => "Connecting to scheduler",
            Stage::Validate => "Validating job",
            Stage::Plan => "Planning job",
            Stage::Register => "Registering job",
            Stage::Status => "Watching deployment",
        }
    }

    /// The stage that must have completed before this one.
    pub fn previous(&self) -> Option<Stage> {
        let index = Stage::ALL.iter().position(|s| s == self)?;
        index.checked_sub(1).map(|i| Stage::ALL[i])
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
