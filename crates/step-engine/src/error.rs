//! Error types for step execution

use contract_core::ContractError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StepError>;

#[derive(Error, Debug)]
pub enum StepError {
    #[error("undefined step: {text}")]
    Undefined { text: String },

    #[error("undefined step (ambiguous): {text} (matches {})", patterns.join(", "))]
    Ambiguous { text: String, patterns: Vec<String> },

    #[error("invalid step pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("step pattern `{pattern}` is already registered")]
    DuplicatePattern { pattern: String },

    #[error("step is missing {what}")]
    MissingArgument { what: String },

    #[error("invalid argument `{value}`: {reason}")]
    InvalidArgument { value: String, reason: String },

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("expected status code {expected}, got {actual}, response body: {body}")]
    UnexpectedStatus {
        expected: String,
        actual: u16,
        body: String,
    },

    #[error("no response received")]
    NoResponse,

    #[error("expected response to contain {expected:?}, got:\n{body}")]
    MissingText { expected: String, body: String },

    #[error("base URL is fixed for the run: configured {configured}, step asked for {requested}")]
    BaseUrlMismatch { configured: String, requested: String },

    #[error("failed to load feature {}: {reason}", path.display())]
    Feature { path: PathBuf, reason: String },

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Coarse classification used by the lifecycle and the reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The scenario uses vocabulary the registry cannot resolve
    Configuration,
    /// The target API could not be reached
    Environment,
    /// The API answered, but not as the scenario expects
    Assertion,
}

impl StepError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::Undefined { .. }
            | StepError::Ambiguous { .. }
            | StepError::InvalidPattern { .. }
            | StepError::DuplicatePattern { .. }
            | StepError::MissingArgument { .. }
            | StepError::InvalidArgument { .. }
            | StepError::BaseUrlMismatch { .. }
            | StepError::Feature { .. } => FailureKind::Configuration,
            StepError::Transport { .. } | StepError::Client { .. } => FailureKind::Environment,
            StepError::UnexpectedStatus { .. }
            | StepError::NoResponse
            | StepError::MissingText { .. } => FailureKind::Assertion,
            StepError::Contract(err) if err.is_assertion() => FailureKind::Assertion,
            StepError::Contract(_) => FailureKind::Configuration,
        }
    }
}
