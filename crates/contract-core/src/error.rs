//! Error types for contract assertions

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContractError>;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("response mismatch (-expected +actual):\n{diff}")]
    ShapeMismatch { diff: String },

    #[error("expected {expected} contacts, got {actual}, response body: {body}")]
    CountMismatch {
        expected: usize,
        actual: usize,
        body: String,
    },

    #[error("failed to parse response as JSON: {reason}, body: {body}")]
    MalformedBody { reason: String, body: String },

    #[error("response does not contain `{field}`, body: {body}")]
    MissingField { field: String, body: String },

    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

impl ContractError {
    /// Whether the error describes a response that broke the contract,
    /// as opposed to a malformed scenario input.
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            ContractError::ShapeMismatch { .. }
                | ContractError::CountMismatch { .. }
                | ContractError::MalformedBody { .. }
                | ContractError::MissingField { .. }
        )
    }
}
