//! Run reports
//!
//! Everything a run produced, in a shape the CLI can print and serialize to
//! JSON.

use crate::error::FailureKind;
use crate::executor::Cleanup;
use chrono::{DateTime, Utc};
use contract_core::ResourceId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// The API answered, but not as the scenario expects
    Failed,
    /// The scenario could not be carried out
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub keyword: String,
    pub text: String,
    pub status: StepStatus,
}

/// Details captured when a step fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub step: String,
    pub kind: FailureKind,
    /// Error message, including the diff for shape mismatches
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownEntry {
    pub id: ResourceId,
    #[serde(flatten)]
    pub result: Cleanup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub feature: String,
    pub name: String,
    pub outcome: Outcome,
    pub steps: Vec<StepReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
    pub teardown: Vec<TeardownEntry>,
    pub duration_ms: u64,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Totals by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub scenarios: usize,
    pub passed: usize,
    pub failed: usize,
    pub aborted: usize,
    pub steps: usize,
    pub skipped_steps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub base_url: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            base_url: base_url.into(),
            scenarios: Vec::new(),
        }
    }

    pub fn push(&mut self, scenario: ScenarioReport) {
        self.scenarios.push(scenario);
    }

    pub fn passed(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| s.passed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed())
    }

    /// True when every scenario passed
    pub fn is_success(&self) -> bool {
        self.scenarios.iter().all(ScenarioReport::passed)
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            scenarios: self.scenarios.len(),
            ..RunSummary::default()
        };
        for scenario in &self.scenarios {
            match scenario.outcome {
                Outcome::Passed => summary.passed += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Aborted => summary.aborted += 1,
            }
            summary.steps += scenario.steps.len();
            summary.skipped_steps += scenario
                .steps
                .iter()
                .filter(|step| step.status == StepStatus::Skipped)
                .count();
        }
        summary
    }
}
