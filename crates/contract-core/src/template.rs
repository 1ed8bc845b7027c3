//! Placeholder substitution for paths and payloads

use crate::state::ResourceId;

/// Token replaced by the identifier most recently created in the scenario
pub const LAST_CREATED_ID: &str = "{lastCreatedID}";

/// Replace every occurrence of [`LAST_CREATED_ID`] in `text`.
///
/// An unset identifier renders as `0`, so scenarios can address a record
/// that was never created and assert on the resulting error.
pub fn resolve(text: &str, last_created_id: Option<ResourceId>) -> String {
    if !text.contains(LAST_CREATED_ID) {
        return text.to_string();
    }
    text.replace(LAST_CREATED_ID, &last_created_id.unwrap_or(0).to_string())
}
