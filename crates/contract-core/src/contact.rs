//! Contact record types

use crate::state::ResourceId;
use serde::{Deserialize, Deserializer, Serialize};

/// A stored contact as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ResourceId,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub email: String,
}

/// Creation payload. Missing fields default to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewContact {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub email: String,
}

impl NewContact {
    /// The fixture contact used by "a contact exists" steps
    pub fn sample() -> Self {
        Self {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone: "1234567890".to_string(),
            email: "john@example.com".to_string(),
            street: "123 Main St".to_string(),
            city: "Anytown".to_string(),
            state: "CA".to_string(),
            zip: "12345".to_string(),
            ..Self::default()
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = last_name.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn into_contact(self, id: ResourceId) -> Contact {
        Contact {
            id,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            street: self.street,
            city: self.city,
            state: self.state,
            zip: self.zip,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// Update payload. Only the fields present are changed; an explicit `null`
/// is rejected rather than read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPatch {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub email: Option<String>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(Some)
}

impl ContactPatch {
    pub fn apply(self, contact: &mut Contact) {
        let fields = [
            (self.first_name, &mut contact.first_name),
            (self.middle_name, &mut contact.middle_name),
            (self.last_name, &mut contact.last_name),
            (self.street, &mut contact.street),
            (self.city, &mut contact.city),
            (self.state, &mut contact.state),
            (self.zip, &mut contact.zip),
            (self.phone, &mut contact.phone),
            (self.email, &mut contact.email),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Search filter. Empty fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactQuery {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub phone: String,
    pub email: String,
}

impl ContactQuery {
    pub fn matches(&self, contact: &Contact) -> bool {
        let exact = [
            (&self.first_name, &contact.first_name),
            (&self.middle_name, &contact.middle_name),
            (&self.last_name, &contact.last_name),
            (&self.street, &contact.street),
            (&self.city, &contact.city),
            (&self.state, &contact.state),
            (&self.zip, &contact.zip),
            (&self.email, &contact.email),
        ];
        if exact
            .iter()
            .any(|(wanted, actual)| !wanted.is_empty() && wanted != actual)
        {
            return false;
        }
        self.phone_matches(&contact.phone)
    }

    /// A three digit phone filter matches the area code
    fn phone_matches(&self, phone: &str) -> bool {
        if self.phone.is_empty() || self.phone == phone {
            return true;
        }
        self.phone.len() == 3 && phone.starts_with(self.phone.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_contact_defaults_missing_fields() {
        let draft: NewContact = serde_json::from_str(r#"{"first_name": "John"}"#).unwrap();
        let contact = draft.into_contact(1);
        assert_eq!(contact.first_name, "John");
        assert_eq!(contact.email, "");
    }

    #[test]
    fn new_contact_rejects_non_string_fields() {
        assert!(serde_json::from_str::<NewContact>(r#"{"first_name": 3}"#).is_err());
    }

    #[test]
    fn patch_changes_only_present_fields() {
        let mut contact = NewContact::sample().into_contact(1);
        let patch: ContactPatch = serde_json::from_str(r#"{"first_name": "Jane"}"#).unwrap();
        patch.apply(&mut contact);
        assert_eq!(contact.first_name, "Jane");
        assert_eq!(contact.last_name, "Doe");
        assert_eq!(contact.phone, "1234567890");
    }

    #[test]
    fn patch_rejects_explicit_null() {
        assert!(serde_json::from_str::<ContactPatch>(r#"{"first_name": null}"#).is_err());
        assert!(serde_json::from_str::<ContactPatch>(r#"{"email": 7}"#).is_err());
        let empty: ContactPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ContactPatch::default());
    }

    #[test]
    fn patch_serializes_without_absent_fields() {
        let patch = ContactPatch {
            first_name: Some("Jane".to_string()),
            ..ContactPatch::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"first_name":"Jane"}"#);
    }

    #[test]
    fn query_matches_area_code_prefix() {
        let contact = NewContact::sample().into_contact(1);
        let by_area = ContactQuery {
            phone: "123".to_string(),
            ..ContactQuery::default()
        };
        let by_partial = ContactQuery {
            phone: "1234".to_string(),
            ..ContactQuery::default()
        };
        assert!(by_area.matches(&contact));
        assert!(!by_partial.matches(&contact));
        assert!(ContactQuery::default().matches(&contact));
    }

    #[test]
    fn query_requires_every_non_empty_field() {
        let contact = NewContact::sample().into_contact(1);
        let query = ContactQuery {
            first_name: "John".to_string(),
            city: "Elsewhere".to_string(),
            ..ContactQuery::default()
        };
        assert!(!query.matches(&contact));
    }
}
