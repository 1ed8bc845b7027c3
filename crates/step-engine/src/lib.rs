//! # Step Engine
//!
//! Executes contacts contract scenarios against a live API.
//!
//! Scenario steps are matched against an explicit [`StepRegistry`] of
//! cucumber-expression patterns. Each scenario runs with its own
//! [`ScenarioContext`]; the [`ScenarioRunner`] deletes whatever the scenario
//! created once it is over.
//!
//! ```no_run
//! use step_engine::{contact_steps, load_paths, HarnessConfig, ScenarioRunner};
//! use std::path::PathBuf;
//!
//! # async fn run() -> step_engine::Result<()> {
//! let scenarios = load_paths(&[PathBuf::from("features")])?;
//! let runner = ScenarioRunner::new(contact_steps()?, HarnessConfig::from_env()?)?;
//! let report = runner.run_all(&scenarios).await;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub use contract_core;

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod feature;
pub mod lifecycle;
pub mod pattern;
pub mod registry;
pub mod report;
pub mod steps;

pub use config::HarnessConfig;
pub use context::ScenarioContext;
pub use error::{FailureKind, Result, StepError};
pub use executor::{Cleanup, RequestExecutor};
pub use feature::{load_feature, load_paths, parse_feature, Scenario};
pub use lifecycle::{Lifecycle, Phase, ScenarioRunner};
pub use pattern::{Arg, ParamKind, StepPattern};
pub use registry::{StepArgs, StepDefinition, StepFn, StepFuture, StepInput, StepKeyword, StepRegistry};
pub use report::{
    FailureReport, Outcome, RunReport, RunSummary, ScenarioReport, StepReport, StepStatus,
    TeardownEntry,
};
pub use steps::contact_steps;
