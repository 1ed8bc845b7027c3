use clap::ValueEnum;
use std::fmt::Write;
use step_engine::{Outcome, RunReport, ScenarioReport, StepRegistry, StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Every scenario with its steps
    Pretty,
    /// One character per scenario, details for failures only
    Progress,
}

pub fn render(report: &RunReport, format: Format) -> String {
    let mut out = String::new();
    match format {
        Format::Pretty => render_pretty(report, &mut out),
        Format::Progress => render_progress(report, &mut out),
    }
    render_summary(report, &mut out);
    out
}

fn render_pretty(report: &RunReport, out: &mut String) {
    let mut feature = None;
    for scenario in &report.scenarios {
        if feature != Some(scenario.feature.as_str()) {
            feature = Some(scenario.feature.as_str());
            let _ = writeln!(out, "Feature: {}", scenario.feature);
        }
        let _ = writeln!(out, "  {} Scenario: {}", outcome_marker(scenario.outcome), scenario.name);
        for step in &scenario.steps {
            let marker = match step.status {
                StepStatus::Passed => "✔",
                StepStatus::Failed => "✘",
                StepStatus::Skipped => "-",
            };
            let _ = writeln!(out, "    {marker} {} {}", step.keyword, step.text);
        }
        render_failure(scenario, out);
    }
}

fn render_progress(report: &RunReport, out: &mut String) {
    for scenario in &report.scenarios {
        out.push(match scenario.outcome {
            Outcome::Passed => '.',
            Outcome::Failed => 'F',
            Outcome::Aborted => 'A',
        });
    }
    out.push('\n');
    for scenario in report.failed() {
        let _ = writeln!(
            out,
            "{} {}: {}",
            outcome_marker(scenario.outcome),
            scenario.feature,
            scenario.name
        );
        render_failure(scenario, out);
    }
}

fn render_failure(scenario: &ScenarioReport, out: &mut String) {
    let Some(failure) = &scenario.failure else {
        return;
    };
    let _ = writeln!(out, "      step: {}", failure.step);
    for line in failure.message.lines() {
        let _ = writeln!(out, "      {line}");
    }
    if let Some(status) = failure.status_code {
        let _ = writeln!(out, "      last status: {status}");
    }
    if let Some(body) = failure.body.as_deref().filter(|b| !b.is_empty()) {
        let _ = writeln!(out, "      last body: {body}");
    }
}

fn render_summary(report: &RunReport, out: &mut String) {
    let summary = report.summary();
    let _ = writeln!(
        out,
        "\n📊 {} scenarios ({} passed, {} failed, {} aborted), {} steps ({} skipped)",
        summary.scenarios,
        summary.passed,
        summary.failed,
        summary.aborted,
        summary.steps,
        summary.skipped_steps
    );
}

fn outcome_marker(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "✅",
        Outcome::Failed => "❌",
        Outcome::Aborted => "⚠️ ",
    }
}

/// The registered vocabulary, one pattern per line
pub fn render_steps(registry: &StepRegistry) -> String {
    let mut out = String::new();
    for definition in registry.definitions() {
        let _ = writeln!(out, "{:<5} {}", definition.keyword().to_string(), definition.pattern());
    }
    out
}
