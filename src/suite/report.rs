// ABOUTME: Per-scenario outcomes and whole-run aggregation.
// ABOUTME: Serializable so the Json output mode can emit reports directly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Outcome of one independently reportable scenario.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum ScenarioStatus {
    Passed,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    #[serde(flatten)]
    pub status: ScenarioStatus,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl ScenarioReport {
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Passed,
            duration,
        }
    }

    pub fn failed(name: impl Into<String>, reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Failed(reason.into()),
            duration,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.status, ScenarioStatus::Passed)
    }
}

/// All scenario outcomes of one harness invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub host: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            host: gethostname::gethostname().to_string_lossy().into_owned(),
            scenarios: Vec::new(),
        }
    }

    pub fn push(&mut self, scenario: ScenarioReport) {
        self.scenarios.push(scenario);
    }

    /// The run passes only if every scenario passed.
    pub fn all_passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::is_passed)
    }

    pub fn failed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| !s.is_passed()).count()
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
