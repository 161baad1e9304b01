// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::deploy::{DeploySummary, Stage, format_secs};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    /// Pick a mode from the `--json` and `--quiet` flags; JSON wins.
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Announce a pipeline stage.
    pub fn stage(&self, stage: Stage) {
        match self.mode {
            OutputMode::Normal => println!("  → {}...", stage.description()),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit(&JsonEvent {
                event: "stage",
                stage: Some(stage.name()),
                message: stage.description(),
                ..JsonEvent::default()
            }),
        }
    }

    /// Report a finished deployment.
    pub fn deployed(&self, summary: &DeploySummary) {
        let message = format!(
            "Deployed {} ({}) to {}",
            summary.service, summary.image, summary.dc
        );
        match self.mode {
            OutputMode::Normal => {
                if let Some(id) = &summary.deployment_id {
                    println!("  ✓ Deployment {} successful", id.short());
                }
                println!("{message} ({})", format_secs(summary.elapsed));
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit(&JsonEvent {
                event: "success",
                message: &message,
                duration_secs: Some(summary.elapsed.as_secs_f64()),
                eval_id: summary.eval_id.as_ref().map(|id| id.as_str()),
                deployment_id: summary.deployment_id.as_ref().map(|id| id.as_str()),
                ..JsonEvent::default()
            }),
        }
    }

    /// Print a line of listing output. In JSON mode each item is an event.
    pub fn item(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit(&JsonEvent {
                event: "item",
                message,
                ..JsonEvent::default()
            }),
        }
    }

    /// Print an error message, with any task errors on following lines.
    pub fn error(&self, message: &str, details: &[String]) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(&self.error_event(message, details)) {
                    eprintln!("{json}");
                }
            }
        }
    }

    fn error_event<'a>(&self, message: &'a str, details: &[String]) -> JsonEvent<'a> {
        JsonEvent {
            event: "error",
            message,
            duration_secs: self.duration(),
            details: details.to_vec(),
            ..JsonEvent::default()
        }
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    fn emit(&self, event: &JsonEvent<'_>) {
        if let Ok(json) = serde_json::to_string(event) {
            println!("{json}");
        }
    }
}

#[derive(Default, Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<&'a str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eval_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deployment_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}
