use contract_core::{Contact, ContactPatch, ContactQuery, NewContact, ResourceId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

const FIRST_ID: ResourceId = 1;

/// In-memory contact records shared by all request handlers
#[derive(Clone)]
pub struct ContactStore {
    records: Arc<DashMap<ResourceId, Contact>>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for ContactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactStore")
            .field("records_count", &self.records.len())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl ContactStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(FIRST_ID)),
        }
    }

    pub fn create(&self, draft: NewContact) -> Contact {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let contact = draft.into_contact(id);
        self.records.insert(id, contact.clone());
        debug!(id, "Contact created");
        contact
    }

    pub fn get(&self, id: ResourceId) -> Option<Contact> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    /// Apply `patch` to an existing record
    pub fn update(&self, id: ResourceId, patch: ContactPatch) -> Option<Contact> {
        let mut entry = self.records.get_mut(&id)?;
        patch.apply(entry.value_mut());
        Some(entry.value().clone())
    }

    pub fn delete(&self, id: ResourceId) -> bool {
        self.records.remove(&id).is_some()
    }

    /// Records matching `query`, ordered by id
    pub fn list(&self, query: &ContactQuery) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self
            .records
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        contacts.sort_by_key(|contact| contact.id);
        contacts
    }

    /// Drop every record and start numbering from 1 again
    pub fn reset(&self) {
        self.records.clear();
        self.next_id.store(FIRST_ID, Ordering::SeqCst);
        info!("Contact store reset");
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for ContactStore {
    fn default() -> Self {
        Self::new()
    }
}
