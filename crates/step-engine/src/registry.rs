//! Step registry
//!
//! An ordered list of `(keyword, pattern, handler)` entries. A step must be
//! matched by exactly one entry: no match is an undefined step, several
//! matches an ambiguous one. Keywords describe the vocabulary but do not take
//! part in matching.

use crate::context::ScenarioContext;
use crate::error::{Result, StepError};
use crate::pattern::{Arg, StepPattern};
use contract_core::{resolve, ResourceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, instrument};

/// Future returned by a step handler
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Step handler. Receives the scenario context and the resolved arguments.
pub type StepFn = for<'a> fn(&'a mut ScenarioContext, StepArgs) -> StepFuture<'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKeyword {
    Given,
    When,
    Then,
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            StepKeyword::Given => "Given",
            StepKeyword::When => "When",
            StepKeyword::Then => "Then",
        };
        f.write_str(keyword)
    }
}

/// A step as it appears in a scenario script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepInput {
    pub keyword: String,
    pub text: String,
    pub docstring: Option<String>,
    pub table: Option<Vec<Vec<String>>>,
}

impl StepInput {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
            docstring: None,
            table: None,
        }
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_table(mut self, table: Vec<Vec<String>>) -> Self {
        self.table = Some(table);
        self
    }
}

impl fmt::Display for StepInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keyword.is_empty() {
            f.write_str(&self.text)
        } else {
            write!(f, "{} {}", self.keyword, self.text)
        }
    }
}

/// Arguments handed to a step handler, with templates already resolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepArgs {
    args: Vec<Arg>,
    docstring: Option<String>,
    table: Option<Vec<Vec<String>>>,
}

impl StepArgs {
    pub fn new(args: Vec<Arg>) -> Self {
        Self {
            args,
            docstring: None,
            table: None,
        }
    }

    /// Build the handler arguments for `step`, substituting the last
    /// created identifier into string arguments, the doc string and table
    /// cells.
    pub fn resolved(args: Vec<Arg>, step: &StepInput, last_created_id: Option<ResourceId>) -> Self {
        let args = args
            .into_iter()
            .map(|arg| match arg {
                Arg::Str(text) => Arg::Str(resolve(&text, last_created_id)),
                other => other,
            })
            .collect();
        let docstring = step
            .docstring
            .as_deref()
            .map(|text| resolve(text, last_created_id));
        let table = step.table.as_ref().map(|rows| {
            rows.iter()
                .map(|row| row.iter().map(|cell| resolve(cell, last_created_id)).collect())
                .collect()
        });
        Self {
            args,
            docstring,
            table,
        }
    }

    pub fn string(&self, index: usize) -> Result<String> {
        match self.args.get(index) {
            Some(Arg::Str(value)) => Ok(value.clone()),
            _ => Err(missing(format!("a string argument at position {index}"))),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        match self.args.get(index) {
            Some(Arg::Int(value)) => Ok(*value),
            _ => Err(missing(format!("an integer argument at position {index}"))),
        }
    }

    pub fn float(&self, index: usize) -> Result<f64> {
        match self.args.get(index) {
            Some(Arg::Float(value)) => Ok(*value),
            Some(Arg::Int(value)) => Ok(*value as f64),
            _ => Err(missing(format!("a number argument at position {index}"))),
        }
    }

    pub fn docstring(&self) -> Result<&str> {
        self.docstring
            .as_deref()
            .ok_or_else(|| missing("a doc string".to_string()))
    }

    pub fn table(&self) -> Result<&[Vec<String>]> {
        self.table
            .as_deref()
            .ok_or_else(|| missing("a data table".to_string()))
    }
}

fn missing(what: String) -> StepError {
    StepError::MissingArgument { what }
}

pub struct StepDefinition {
    keyword: StepKeyword,
    pattern: StepPattern,
    run: StepFn,
}

impl StepDefinition {
    pub fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("keyword", &self.keyword)
            .field("pattern", &self.pattern.source())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and append a step definition.
    ///
    /// Fails on malformed patterns and on a pattern that is already
    /// registered.
    pub fn register(&mut self, keyword: StepKeyword, pattern: &str, run: StepFn) -> Result<&mut Self> {
        if self.definitions.iter().any(|d| d.pattern.source() == pattern) {
            return Err(StepError::DuplicatePattern {
                pattern: pattern.to_string(),
            });
        }
        let pattern = StepPattern::compile(pattern)?;
        self.definitions.push(StepDefinition {
            keyword,
            pattern,
            run,
        });
        Ok(self)
    }

    pub fn given(&mut self, pattern: &str, run: StepFn) -> Result<&mut Self> {
        self.register(StepKeyword::Given, pattern, run)
    }

    pub fn when(&mut self, pattern: &str, run: StepFn) -> Result<&mut Self> {
        self.register(StepKeyword::When, pattern, run)
    }

    pub fn then(&mut self, pattern: &str, run: StepFn) -> Result<&mut Self> {
        self.register(StepKeyword::Then, pattern, run)
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Find the single definition matching `text` and extract its arguments
    pub fn find(&self, text: &str) -> Result<(&StepDefinition, Vec<Arg>)> {
        let mut matching = self
            .definitions
            .iter()
            .filter(|definition| definition.pattern.is_match(text));

        let Some(definition) = matching.next() else {
            return Err(StepError::Undefined {
                text: text.to_string(),
            });
        };
        let others: Vec<&StepDefinition> = matching.collect();
        if !others.is_empty() {
            let patterns = std::iter::once(definition)
                .chain(others)
                .map(|d| d.pattern.source().to_string())
                .collect();
            return Err(StepError::Ambiguous {
                text: text.to_string(),
                patterns,
            });
        }

        let args = definition
            .pattern
            .extract(text)
            .ok_or_else(|| StepError::Undefined {
                text: text.to_string(),
            })??;
        Ok((definition, args))
    }

    /// Resolve and run one step against the scenario context
    #[instrument(skip(self, ctx, step), fields(scenario = %ctx.state().id(), step = %step.text))]
    pub async fn dispatch(&self, ctx: &mut ScenarioContext, step: &StepInput) -> Result<()> {
        let (definition, args) = self.find(&step.text)?;
        debug!(pattern = definition.pattern.source(), "Dispatching step");
        let args = StepArgs::resolved(args, step, ctx.state().last_created_id());
        (definition.run)(ctx, args).await
    }
}
