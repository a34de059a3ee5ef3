// ABOUTME: Output formatting for scenario progress and the run summary.
// ABOUTME: Supports normal, quiet (CI), and JSON-lines output modes.

use crate::suite::RunReport;
use serde::Serialize;
use std::time::Duration;

/// Output mode for harness feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with per-scenario progress.
    Normal,
    /// Minimal output for CI (failures and the final verdict only).
    Quiet,
    /// JSON lines for scripting.
    Json,
}

/// Handles harness output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    scenario: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    duration_secs: f64,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    fn emit<T: Serialize>(&self, event: T) {
        if let Ok(json) = serde_json::to_string(&event) {
            println!("{json}");
        }
    }

    pub fn scenario_started(&self, name: &str) {
        if self.mode == OutputMode::Normal {
            println!("→ {name}");
        }
    }

    pub fn scenario_passed(&self, name: &str, duration: Duration) {
        match self.mode {
            OutputMode::Normal => {
                println!("  ✓ {name} ({:.1}s)", duration.as_secs_f64());
            }
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit(JsonEvent {
                event: "scenario",
                scenario: name,
                status: "passed",
                reason: None,
                duration_secs: duration.as_secs_f64(),
            }),
        }
    }

    pub fn scenario_failed(&self, name: &str, reason: &str, duration: Duration) {
        match self.mode {
            OutputMode::Normal => {
                println!("  ✗ {name}: {reason}");
            }
            OutputMode::Quiet => {
                println!("FAIL {name}: {reason}");
            }
            OutputMode::Json => self.emit(JsonEvent {
                event: "scenario",
                scenario: name,
                status: "failed",
                reason: Some(reason),
                duration_secs: duration.as_secs_f64(),
            }),
        }
    }

    /// Final verdict for the whole run.
    pub fn summary(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                let total = report.scenarios.len();
                let failed = report.failed_count();
                if failed == 0 {
                    println!("PASS: {total} scenarios");
                } else {
                    println!("FAIL: {failed} of {total} scenarios failed");
                }
            }
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(report) {
                    println!("{json}");
                }
            }
        }
    }
}
