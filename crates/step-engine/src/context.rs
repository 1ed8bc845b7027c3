//! Per-scenario context handed to every step handler

use crate::error::{Result, StepError};
use crate::executor::RequestExecutor;
use contract_core::{ContractError, NewContact, ResourceId, ScenarioState};
use serde_json::Value;

/// Scenario state plus the executor that mutates it
#[derive(Debug)]
pub struct ScenarioContext {
    state: ScenarioState,
    executor: RequestExecutor,
}

impl ScenarioContext {
    pub fn new(state: ScenarioState, executor: RequestExecutor) -> Self {
        Self { state, executor }
    }

    pub fn state(&self) -> &ScenarioState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ScenarioState {
        &mut self.state
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub async fn create(&mut self, path: &str, payload: &str) -> Result<Option<ResourceId>> {
        self.executor.create(&mut self.state, path, payload).await
    }

    pub async fn read(&mut self, path: &str) -> Result<()> {
        self.executor.read(&mut self.state, path).await?;
        Ok(())
    }

    pub async fn update(&mut self, path: &str, payload: &str) -> Result<()> {
        self.executor.update(&mut self.state, path, payload).await?;
        Ok(())
    }

    pub async fn delete(&mut self, path: &str) -> Result<()> {
        self.executor.delete(&mut self.state, path).await?;
        Ok(())
    }

    pub async fn probe(&self) -> Result<()> {
        self.executor.probe(&self.state).await?;
        Ok(())
    }

    /// Create a fixture contact and insist on a `201 Created` response
    /// carrying an identifier.
    pub async fn create_contact(&mut self, path: &str, contact: &NewContact) -> Result<ResourceId> {
        let payload = serde_json::to_string(contact).map_err(ContractError::from)?;
        let id = self.create(path, &payload).await?;
        self.expect_status(201)?;
        id.ok_or_else(|| {
            ContractError::MissingField {
                field: "id".to_string(),
                body: self.state.last_body_text().into_owned(),
            }
            .into()
        })
    }

    pub fn expect_status(&self, expected: u16) -> Result<()> {
        let actual = self.state.last_status().ok_or(StepError::NoResponse)?;
        if actual == expected {
            return Ok(());
        }
        Err(StepError::UnexpectedStatus {
            expected: expected.to_string(),
            actual,
            body: self.state.last_body_text().into_owned(),
        })
    }

    pub fn expect_success(&self) -> Result<()> {
        let actual = self.state.last_status().ok_or(StepError::NoResponse)?;
        if (200..300).contains(&actual) {
            return Ok(());
        }
        Err(StepError::UnexpectedStatus {
            expected: "2xx".to_string(),
            actual,
            body: self.state.last_body_text().into_owned(),
        })
    }

    /// The last response body parsed as JSON
    pub fn response_json(&self) -> Result<Value> {
        if self.state.last_status().is_none() {
            return Err(StepError::NoResponse);
        }
        Ok(self.state.last_json()?)
    }
}
