//! Request executor
//!
//! Performs the CRUD verbs against the run's base URL and records every
//! outcome into the scenario state. Transport failures are returned as-is;
//! nothing is retried.

use crate::config::HarnessConfig;
use crate::error::{Result, StepError};
use contract_core::state::extract_id;
use contract_core::{endpoints, ResourceId, ScenarioState};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Result of a best-effort teardown delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Cleanup {
    Deleted,
    AlreadyGone,
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
}

impl RequestExecutor {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| StepError::Client { source })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// POST `payload` to `path`.
    ///
    /// On a 2xx response carrying an `id`, the identifier becomes the last
    /// created one and is tracked for teardown. A missing `id` is not an
    /// error here; steps that require one check the returned value.
    #[instrument(skip(self, state, payload), fields(scenario = %state.id()))]
    pub async fn create(
        &self,
        state: &mut ScenarioState,
        path: &str,
        payload: &str,
    ) -> Result<Option<ResourceId>> {
        let status = self.send(state, Method::POST, path, Some(payload)).await?;
        if !status.is_success() {
            debug!(status = status.as_u16(), "Creation rejected");
            return Ok(None);
        }
        match extract_id(state.last_body()) {
            Some(id) => {
                info!(id, "Created resource");
                state.record_creation(id);
                Ok(Some(id))
            }
            None => {
                warn!(body = %state.last_body_text(), "Creation response has no usable id");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, state), fields(scenario = %state.id()))]
    pub async fn read(&self, state: &mut ScenarioState, path: &str) -> Result<StatusCode> {
        self.send(state, Method::GET, path, None).await
    }

    #[instrument(skip(self, state, payload), fields(scenario = %state.id()))]
    pub async fn update(
        &self,
        state: &mut ScenarioState,
        path: &str,
        payload: &str,
    ) -> Result<StatusCode> {
        self.send(state, Method::PUT, path, Some(payload)).await
    }

    /// DELETE `path`. The identifier stays tracked; teardown tolerates
    /// resources that are already gone.
    #[instrument(skip(self, state), fields(scenario = %state.id()))]
    pub async fn delete(&self, state: &mut ScenarioState, path: &str) -> Result<StatusCode> {
        self.send(state, Method::DELETE, path, None).await
    }

    /// Reachability check that leaves the recorded response untouched
    #[instrument(skip(self, state), fields(scenario = %state.id()))]
    pub async fn probe(&self, state: &ScenarioState) -> Result<StatusCode> {
        let url = state.url(endpoints::RECORDS);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| transport(&Method::GET, &url, source))?;
        debug!(status = response.status().as_u16(), "API reachable");
        Ok(response.status())
    }

    /// Best-effort delete used by teardown. Never fails and never touches
    /// the recorded response.
    #[instrument(skip(self, state), fields(scenario = %state.id()))]
    pub async fn purge(&self, state: &ScenarioState, id: ResourceId) -> Cleanup {
        let url = state.url(&endpoints::record(id));
        let cleanup = match self.client.delete(&url).send().await {
            Ok(response) if response.status().is_success() => Cleanup::Deleted,
            Ok(response) if response.status() == StatusCode::NOT_FOUND => Cleanup::AlreadyGone,
            Ok(response) => Cleanup::Failed {
                reason: format!("unexpected status {}", response.status().as_u16()),
            },
            Err(err) => Cleanup::Failed {
                reason: err.to_string(),
            },
        };
        match &cleanup {
            Cleanup::Failed { reason } => warn!(id, %reason, "Teardown delete failed"),
            other => debug!(id, result = ?other, "Teardown delete"),
        }
        cleanup
    }

    async fn send(
        &self,
        state: &mut ScenarioState,
        method: Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<StatusCode> {
        let url = state.url(path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|source| transport(&method, &url, source))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| transport(&method, &url, source))?;

        debug!(%method, %url, status = status.as_u16(), "Request completed");
        state.record_response(status.as_u16(), bytes.to_vec());
        Ok(status)
    }
}

fn transport(method: &Method, url: &str, source: reqwest::Error) -> StepError {
    StepError::Transport {
        method: method.to_string(),
        url: url.to_string(),
        source,
    }
}
