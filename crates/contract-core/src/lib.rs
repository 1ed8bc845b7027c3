//! # Contract Core
//!
//! Core types for the contacts contract-test harness.
//!
//! ## What lives here
//! - Per-scenario state: last response, last created identifier, created resources
//! - Template resolution of the last created identifier into paths and payloads
//! - Structural JSON comparison with a line-oriented diff on mismatch
//! - The contact record shape shared by fixtures and the reference server

pub mod contact;
pub mod error;
pub mod json;
pub mod state;
pub mod template;

pub use contact::{Contact, ContactPatch, ContactQuery, NewContact};
pub use error::{ContractError, Result};
pub use json::{compare, compare_list, contains, Comparison};
pub use state::{extract_id, ResourceId, ScenarioState};
pub use template::{resolve, LAST_CREATED_ID};

/// Current harness version, reported by the CLI and the reference server
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build information for logs and reports
pub const BUILD_INFO: &str = concat!(
    "Contacts contract harness ",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_NAME"),
    ")"
);

/// Routes of the contacts API
pub mod endpoints {
    pub const HEALTH: &str = "/health";
    pub const RECORDS: &str = "/records";
    pub const RESET: &str = "/reset";

    /// Path of a single record
    pub fn record(id: super::ResourceId) -> String {
        format!("{RECORDS}/{id}")
    }
}
