// ABOUTME: Bounds and intervals for the two scheduler polling loops.
// ABOUTME: Overridable per datacenter with humantime durations.

use serde::Deserialize;
use std::time::Duration;

/// Timing of the evaluation wait and the deployment long-poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Sleep between evaluation lookups.
    #[serde(with = "humantime_serde")]
    pub evaluation_interval: Duration,

    /// Give up waiting for an evaluation to produce a deployment after this long.
    #[serde(with = "humantime_serde")]
    pub evaluation_timeout: Duration,

    /// Server-side wait of each blocking deployment query.
    #[serde(with = "humantime_serde")]
    pub deployment_wait: Duration,

    /// Give up watching a deployment after this long.
    #[serde(with = "humantime_serde")]
    pub deployment_timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            evaluation_interval: Duration::from_secs(1),
            evaluation_timeout: Duration::from_secs(5 * 60),
            deployment_wait: Duration::from_secs(5),
            deployment_timeout: Duration::from_secs(30 * 60),
        }
    }
}
