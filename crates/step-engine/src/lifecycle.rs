//! Scenario lifecycle
//!
//! `NotStarted -> Running -> (Passed | Failed | Aborted) -> TornDown`
//!
//! Every scenario gets a fresh [`ScenarioState`]. Steps run in order until
//! one fails; the rest are skipped. Teardown deletes everything the scenario
//! created whatever the outcome, and never changes it.

use crate::config::HarnessConfig;
use crate::context::ScenarioContext;
use crate::error::{FailureKind, Result, StepError};
use crate::executor::RequestExecutor;
use crate::feature::Scenario;
use crate::registry::{StepInput, StepRegistry};
use crate::report::{
    FailureReport, Outcome, RunReport, ScenarioReport, StepReport, StepStatus, TeardownEntry,
};
use contract_core::ScenarioState;
use std::time::Instant;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    Passed,
    Failed,
    Aborted,
    TornDown,
}

impl Phase {
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::NotStarted, Phase::Running)
                | (Phase::Running, Phase::Passed)
                | (Phase::Running, Phase::Failed)
                | (Phase::Running, Phase::Aborted)
                | (Phase::Passed, Phase::TornDown)
                | (Phase::Failed, Phase::TornDown)
                | (Phase::Aborted, Phase::TornDown)
        )
    }

    /// Outcome of a finished scenario, `None` while it is not finished
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Phase::Passed => Some(Outcome::Passed),
            Phase::Failed => Some(Outcome::Failed),
            Phase::Aborted => Some(Outcome::Aborted),
            _ => None,
        }
    }
}

/// Tracks the phase of one scenario
#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
    outcome: Option<Outcome>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Outcome reached before teardown, kept once torn down
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Move to `next`. Illegal transitions leave the phase unchanged and
    /// return false.
    #[must_use]
    pub fn advance(&mut self, next: Phase) -> bool {
        if !self.phase.can_transition_to(next) {
            warn!(from = ?self.phase, to = ?next, "Rejected lifecycle transition");
            return false;
        }
        if let Some(outcome) = next.outcome() {
            self.outcome = Some(outcome);
        }
        self.phase = next;
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs scenarios one after another against a live API
#[derive(Debug)]
pub struct ScenarioRunner {
    registry: StepRegistry,
    executor: RequestExecutor,
    config: HarnessConfig,
}

impl ScenarioRunner {
    pub fn new(registry: StepRegistry, config: HarnessConfig) -> Result<Self> {
        let executor = RequestExecutor::new(&config)?;
        Ok(Self {
            registry,
            executor,
            config,
        })
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[instrument(skip(self, scenario), fields(feature = %scenario.feature, scenario = %scenario.name))]
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioReport {
        let started = Instant::now();
        let mut lifecycle = Lifecycle::new();
        let mut ctx = ScenarioContext::new(
            ScenarioState::new(&self.config.base_url),
            self.executor.clone(),
        );
        let _ = lifecycle.advance(Phase::Running);

        let mut steps = Vec::with_capacity(scenario.steps.len());
        let mut failure = None;
        for step in &scenario.steps {
            if failure.is_some() {
                steps.push(step_report(step, StepStatus::Skipped));
                continue;
            }
            match self.registry.dispatch(&mut ctx, step).await {
                Ok(()) => steps.push(step_report(step, StepStatus::Passed)),
                Err(err) => {
                    steps.push(step_report(step, StepStatus::Failed));
                    let next = match err.kind() {
                        FailureKind::Assertion => Phase::Failed,
                        FailureKind::Configuration | FailureKind::Environment => Phase::Aborted,
                    };
                    let _ = lifecycle.advance(next);
                    failure = Some(failure_report(step, &err, ctx.state()));
                }
            }
        }
        if failure.is_none() {
            let _ = lifecycle.advance(Phase::Passed);
        }

        let teardown = self.teardown(ctx.state_mut()).await;
        let _ = lifecycle.advance(Phase::TornDown);

        let outcome = lifecycle.outcome().unwrap_or(Outcome::Aborted);
        match &failure {
            Some(f) => warn!(?outcome, step = %f.step, error = %f.message, "Scenario did not pass"),
            None => info!("Scenario passed"),
        }

        ScenarioReport {
            feature: scenario.feature.clone(),
            name: scenario.name.clone(),
            outcome,
            steps,
            failure,
            teardown,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Run every scenario in order
    pub async fn run_all(&self, scenarios: &[Scenario]) -> RunReport {
        let mut report = RunReport::new(&self.config.base_url);
        for scenario in scenarios {
            report.push(self.run_scenario(scenario).await);
        }
        let summary = report.summary();
        info!(
            scenarios = summary.scenarios,
            passed = summary.passed,
            failed = summary.failed,
            aborted = summary.aborted,
            "Run finished"
        );
        report
    }

    async fn teardown(&self, state: &mut ScenarioState) -> Vec<TeardownEntry> {
        let targets = state.take_teardown_targets();
        let mut entries = Vec::with_capacity(targets.len());
        for id in targets {
            let result = self.executor.purge(state, id).await;
            entries.push(TeardownEntry { id, result });
        }
        entries
    }
}

fn step_report(step: &StepInput, status: StepStatus) -> StepReport {
    StepReport {
        keyword: step.keyword.clone(),
        text: step.text.clone(),
        status,
    }
}

fn failure_report(step: &StepInput, err: &StepError, state: &ScenarioState) -> FailureReport {
    let status_code = state.last_status();
    FailureReport {
        step: step.to_string(),
        kind: err.kind(),
        message: err.to_string(),
        status_code,
        body: status_code.map(|_| state.last_body_text().into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{StepArgs, StepFuture};

    #[test]
    fn lifecycle_follows_the_happy_path() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.advance(Phase::Running));
        assert!(lifecycle.advance(Phase::Passed));
        assert!(lifecycle.advance(Phase::TornDown));
        assert_eq!(lifecycle.phase(), Phase::TornDown);
        assert_eq!(lifecycle.outcome(), Some(Outcome::Passed));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut lifecycle = Lifecycle::new();
        assert!(!lifecycle.advance(Phase::Passed));
        assert!(lifecycle.advance(Phase::Running));
        assert!(lifecycle.advance(Phase::Failed));
        assert!(!lifecycle.advance(Phase::Passed));
        assert!(lifecycle.advance(Phase::TornDown));
        assert!(!lifecycle.advance(Phase::Running));
        assert_eq!(lifecycle.outcome(), Some(Outcome::Failed));
    }

    fn pass<'a>(_ctx: &'a mut ScenarioContext, _args: StepArgs) -> StepFuture<'a> {
        Box::pin(async { Ok(()) })
    }

    fn status_check<'a>(ctx: &'a mut ScenarioContext, args: StepArgs) -> StepFuture<'a> {
        Box::pin(async move { ctx.expect_status(args.int(0)? as u16) })
    }

    fn runner() -> ScenarioRunner {
        let mut registry = StepRegistry::new();
        registry
            .given("nothing happens", pass)
            .unwrap()
            .then("the response status should be {int}", status_check)
            .unwrap();
        // nothing listens on the discard port, teardown has nothing to do
        ScenarioRunner::new(registry, HarnessConfig::new("http://127.0.0.1:9").with_timeout_secs(1))
            .unwrap()
    }

    #[tokio::test]
    async fn assertion_failure_fails_and_skips_the_rest() {
        let scenario = Scenario::new("Contacts", "no request made")
            .with_step(StepInput::new("Given", "nothing happens"))
            .with_step(StepInput::new("Then", "the response status should be 200"))
            .with_step(StepInput::new("And", "nothing happens"));

        let report = runner().run_scenario(&scenario).await;

        assert_eq!(report.outcome, Outcome::Failed);
        let statuses: Vec<StepStatus> = report.steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![StepStatus::Passed, StepStatus::Failed, StepStatus::Skipped]
        );
        let failure = report.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Assertion);
        assert_eq!(failure.message, "no response received");
        assert_eq!(failure.status_code, None);
        assert!(report.teardown.is_empty());
    }

    #[tokio::test]
    async fn undefined_step_aborts_the_scenario() {
        let scenario = Scenario::new("Contacts", "typo")
            .with_step(StepInput::new("Given", "nothing happenz"))
            .with_step(StepInput::new("Then", "the response status should be 200"));

        let report = runner().run_scenario(&scenario).await;

        assert_eq!(report.outcome, Outcome::Aborted);
        assert_eq!(report.steps[1].status, StepStatus::Skipped);
        let failure = report.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Configuration);
        assert_eq!(failure.step, "Given nothing happenz");
    }

    #[tokio::test]
    async fn run_all_collects_every_scenario() {
        let ok = Scenario::new("Contacts", "ok").with_step(StepInput::new("Given", "nothing happens"));
        let broken = Scenario::new("Contacts", "broken").with_step(StepInput::new("Given", "???"));

        let report = runner().run_all(&[ok, broken]).await;

        assert_eq!(report.scenarios.len(), 2);
        assert_eq!(report.base_url, "http://127.0.0.1:9");
        assert!(report.scenarios[0].passed());
        assert!(!report.is_success());
    }
}
