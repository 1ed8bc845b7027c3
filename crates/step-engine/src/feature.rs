//! Gherkin feature loading
//!
//! Flattens `.feature` files into runnable scenarios: background steps are
//! prepended, rules are inlined, and every examples row of a scenario
//! outline becomes its own scenario with `<column>` placeholders substituted.

use crate::error::{Result, StepError};
use crate::registry::StepInput;
use gherkin::{Feature, GherkinEnv};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A scenario ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub feature: String,
    pub name: String,
    pub tags: Vec<String>,
    pub steps: Vec<StepInput>,
}

impl Scenario {
    pub fn new(feature: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            name: name.into(),
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: StepInput) -> Self {
        self.steps.push(step);
        self
    }
}

/// Parse feature text. `path` is only used for error messages.
pub fn parse_feature(text: &str, path: &Path) -> Result<Vec<Scenario>> {
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    let feature = Feature::parse(&text, GherkinEnv::default()).map_err(|err| StepError::Feature {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    Ok(flatten(&feature))
}

pub fn load_feature(path: &Path) -> Result<Vec<Scenario>> {
    let text = std::fs::read_to_string(path).map_err(|err| StepError::Feature {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let scenarios = parse_feature(&text, path)?;
    debug!(path = %path.display(), scenarios = scenarios.len(), "Loaded feature");
    Ok(scenarios)
}

/// Load every scenario under `paths`. Directories are searched recursively
/// for `.feature` files, visited in sorted order.
pub fn load_paths(paths: &[PathBuf]) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();
    for path in paths {
        for file in feature_files(path)? {
            scenarios.extend(load_feature(&file)?);
        }
    }
    Ok(scenarios)
}

fn feature_files(base: &Path) -> Result<Vec<PathBuf>> {
    if base.is_file() {
        return Ok(vec![base.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(base).follow_links(false) {
        let entry = entry.map_err(|err| StepError::Feature {
            path: base.to_path_buf(),
            reason: err.to_string(),
        })?;
        if entry.file_type().is_file() && is_feature_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_feature_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"))
}

fn flatten(feature: &Feature) -> Vec<Scenario> {
    let background = feature
        .background
        .as_ref()
        .map(|b| convert_steps(&b.steps))
        .unwrap_or_default();

    let mut scenarios = Vec::new();
    for scenario in &feature.scenarios {
        expand(feature, &feature.tags, &background, scenario, &mut scenarios);
    }
    for rule in &feature.rules {
        let mut rule_background = background.clone();
        if let Some(b) = rule.background.as_ref() {
            rule_background.extend(convert_steps(&b.steps));
        }
        let tags = merge_tags(&feature.tags, &rule.tags);
        for scenario in &rule.scenarios {
            expand(feature, &tags, &rule_background, scenario, &mut scenarios);
        }
    }
    scenarios
}

fn expand(
    feature: &Feature,
    inherited_tags: &[String],
    background: &[StepInput],
    scenario: &gherkin::Scenario,
    out: &mut Vec<Scenario>,
) {
    let tags = merge_tags(inherited_tags, &scenario.tags);
    let mut steps = background.to_vec();
    steps.extend(convert_steps(&scenario.steps));

    let tables: Vec<(&gherkin::Examples, &gherkin::Table)> = scenario
        .examples
        .iter()
        .filter_map(|examples| examples.table.as_ref().map(|table| (examples, table)))
        .collect();
    if tables.is_empty() {
        out.push(Scenario {
            feature: feature.name.clone(),
            name: scenario.name.clone(),
            tags,
            steps,
        });
        return;
    }

    let mut index = 0;
    for (examples, table) in tables {
        let Some((header, rows)) = table.rows.split_first() else {
            continue;
        };
        for row in rows {
            index += 1;
            let bindings: Vec<(String, &str)> = header
                .iter()
                .zip(row)
                .map(|(column, value)| (format!("<{column}>"), value.as_str()))
                .collect();
            out.push(Scenario {
                feature: feature.name.clone(),
                name: format!("{} (example {index})", substitute(&scenario.name, &bindings)),
                tags: merge_tags(&tags, &examples.tags),
                steps: steps.iter().map(|step| bind_step(step, &bindings)).collect(),
            });
        }
    }
}

fn convert_steps(steps: &[gherkin::Step]) -> Vec<StepInput> {
    steps
        .iter()
        .map(|step| StepInput {
            keyword: step.keyword.trim().to_string(),
            text: step.value.clone(),
            docstring: step.docstring.as_deref().map(normalize_docstring),
            table: step.table.as_ref().map(|table| table.rows.clone()),
        })
        .collect()
}

/// Doc strings start right after the opening delimiter line
fn normalize_docstring(text: &str) -> String {
    text.strip_prefix('\n').unwrap_or(text).to_string()
}

fn bind_step(step: &StepInput, bindings: &[(String, &str)]) -> StepInput {
    StepInput {
        keyword: step.keyword.clone(),
        text: substitute(&step.text, bindings),
        docstring: step.docstring.as_deref().map(|d| substitute(d, bindings)),
        table: step.table.as_ref().map(|rows| {
            rows.iter()
                .map(|row| row.iter().map(|cell| substitute(cell, bindings)).collect())
                .collect()
        }),
    }
}

fn substitute(text: &str, bindings: &[(String, &str)]) -> String {
    bindings
        .iter()
        .fold(text.to_string(), |acc, (placeholder, value)| acc.replace(placeholder, value))
}

fn merge_tags(base: &[String], extra: &[String]) -> Vec<String> {
    let mut tags = base.to_vec();
    for tag in extra {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}
