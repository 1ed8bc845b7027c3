//! Per-scenario state
//!
//! One [`ScenarioState`] is allocated for every scenario and dropped when
//! the scenario has been torn down. Nothing in here is shared between
//! scenarios.

use crate::error::{ContractError, Result};
use serde_json::Value;
use std::borrow::Cow;
use tracing::{debug, warn};
use uuid::Uuid;

pub type ResourceId = u64;

#[derive(Debug)]
pub struct ScenarioState {
    id: Uuid,
    base_url: String,
    last_response_body: Vec<u8>,
    last_status: Option<u16>,
    last_created_id: Option<ResourceId>,
    created_resources: Vec<ResourceId>,
}

impl ScenarioState {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            id: Uuid::new_v4(),
            base_url,
            last_response_body: Vec::new(),
            last_status: None,
            last_created_id: None,
            created_resources: Vec::new(),
        }
    }

    /// Identifier used to correlate log lines of one scenario
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Overwrite the last response, whatever its outcome
    pub fn record_response(&mut self, status: u16, body: Vec<u8>) {
        debug!(scenario = %self.id, status, bytes = body.len(), "Recorded response");
        self.last_status = Some(status);
        self.last_response_body = body;
    }

    /// Track a freshly created resource for templating and teardown
    pub fn record_creation(&mut self, id: ResourceId) {
        debug!(scenario = %self.id, id, "Tracking created resource");
        self.last_created_id = Some(id);
        self.created_resources.push(id);
    }

    pub fn last_status(&self) -> Option<u16> {
        self.last_status
    }

    pub fn last_body(&self) -> &[u8] {
        &self.last_response_body
    }

    pub fn last_body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.last_response_body)
    }

    /// Parse the last response body as JSON
    pub fn last_json(&self) -> Result<Value> {
        serde_json::from_slice(&self.last_response_body).map_err(|err| {
            ContractError::MalformedBody {
                reason: err.to_string(),
                body: self.last_body_text().into_owned(),
            }
        })
    }

    pub fn last_created_id(&self) -> Option<ResourceId> {
        self.last_created_id
    }

    pub fn created_resources(&self) -> &[ResourceId] {
        &self.created_resources
    }

    /// Drain everything teardown must delete.
    ///
    /// Created resources come first in creation order, followed by the last
    /// created identifier when it was not already tracked. Duplicates are
    /// dropped. The last created identifier is cleared.
    pub fn take_teardown_targets(&mut self) -> Vec<ResourceId> {
        let mut targets: Vec<ResourceId> = Vec::with_capacity(self.created_resources.len() + 1);
        for id in self
            .created_resources
            .drain(..)
            .chain(self.last_created_id.take())
        {
            if !targets.contains(&id) {
                targets.push(id);
            }
        }
        targets
    }
}

/// Extract the `id` of a creation response.
///
/// Integers and floats without a fractional part are accepted; anything
/// else yields `None`.
pub fn extract_id(body: &[u8]) -> Option<ResourceId> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let id = value.get("id")?;
    if let Some(id) = id.as_u64() {
        return Some(id);
    }
    match id.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Some(f as u64),
        _ => {
            warn!(id = %id, "Creation response carries a non-integer id");
            None
        }
    }
}
