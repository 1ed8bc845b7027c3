//! Run configuration

use crate::error::{Result, StepError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const BASE_URL_ENV: &str = "CONTACTS_API_URL";
pub const TIMEOUT_ENV: &str = "CONTACTS_API_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings fixed for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl HarnessConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// A zero timeout would fail every request before it is sent
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(StepError::InvalidArgument {
                value: "0".to_string(),
                reason: "request timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// Read `CONTACTS_API_URL` and `CONTACTS_API_TIMEOUT_SECS`, falling back
    /// to the defaults when unset.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let config = Self::new(base_url);
        match std::env::var(TIMEOUT_ENV) {
            Ok(raw) => {
                let secs = raw.trim().parse().map_err(|err: std::num::ParseIntError| {
                    StepError::InvalidArgument {
                        value: raw.clone(),
                        reason: format!("{TIMEOUT_ENV}: {err}"),
                    }
                })?;
                let config = config.with_timeout_secs(secs);
                config.validate()?;
                Ok(config)
            }
            Err(_) => Ok(config),
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
