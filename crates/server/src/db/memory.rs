//! In-process store implementing all three storage seams.
//!
//! Used by tests and local experiments. Each operation takes one lock for
//! its whole read-modify-write, which gives the same "insert or return
//! existing" atomicity the unique indexes give in `PostgreSQL`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use peerbook_core::{CollectionId, DateLabel, DeviceId, EntryId, UserId};

use super::{CollectionProvisioner, DeviceRegistry, RepositoryError, UserDirectory};
use crate::models::{
    Collection, CollectionSummary, DeviceEntry, NewDeviceEntry, Registration, User,
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    collections: HashMap<(UserId, DateLabel), Collection>,
    entries: HashMap<(UserId, DeviceId), DeviceEntry>,
    next_collection_id: i64,
    next_entry_id: i64,
    unavailable: bool,
}

/// Shared in-memory address book. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user in the directory.
    pub fn add_user(&self, id: UserId, username: &str) -> User {
        let user = User {
            id,
            username: username.to_owned(),
        };
        self.lock().users.insert(id, user.clone());
        user
    }

    /// Make every subsequent storage call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Number of stored collections across all users.
    #[must_use]
    pub fn collection_count(&self) -> usize {
        self.lock().collections.len()
    }

    /// Number of stored entries across all users.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Look up a single entry.
    #[must_use]
    pub fn entry(&self, user_id: UserId, device_id: &DeviceId) -> Option<DeviceEntry> {
        self.lock()
            .entries
            .get(&(user_id, device_id.clone()))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        let state = self.lock();
        if state.unavailable {
            return Err(RepositoryError::Unavailable(
                "memory store switched off".to_owned(),
            ));
        }
        Ok(state)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn resolve(&self, user_id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.available()?.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl CollectionProvisioner for MemoryStore {
    async fn get_or_create(
        &self,
        user_id: UserId,
        label: DateLabel,
    ) -> Result<Collection, RepositoryError> {
        let mut state = self.available()?;
        if let Some(existing) = state.collections.get(&(user_id, label)) {
            return Ok(existing.clone());
        }

        state.next_collection_id += 1;
        let collection = Collection {
            id: CollectionId::new(state.next_collection_id),
            user_id,
            label,
            created_at: Utc::now(),
        };
        state
            .collections
            .insert((user_id, label), collection.clone());
        Ok(collection)
    }

    async fn find(
        &self,
        user_id: UserId,
        label: DateLabel,
    ) -> Result<Option<Collection>, RepositoryError> {
        Ok(self.available()?.collections.get(&(user_id, label)).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CollectionSummary>, RepositoryError> {
        let state = self.available()?;
        let mut summaries: Vec<CollectionSummary> = state
            .collections
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| {
                let count = state
                    .entries
                    .values()
                    .filter(|e| e.collection_id == c.id)
                    .count();
                CollectionSummary {
                    collection: c.clone(),
                    device_count: i64::try_from(count).unwrap_or(i64::MAX),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.collection.label.cmp(&a.collection.label));
        Ok(summaries)
    }
}

#[async_trait]
impl DeviceRegistry for MemoryStore {
    async fn exists(
        &self,
        user_id: UserId,
        device_id: &DeviceId,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .available()?
            .entries
            .contains_key(&(user_id, device_id.clone())))
    }

    async fn create(&self, entry: NewDeviceEntry) -> Result<Registration, RepositoryError> {
        let mut state = self.available()?;
        let key = (entry.user_id, entry.device_id.clone());
        if state.entries.contains_key(&key) {
            return Ok(Registration::AlreadyRegistered);
        }

        state.next_entry_id += 1;
        let stored = DeviceEntry {
            row_id: EntryId::new(state.next_entry_id),
            device_id: entry.device_id,
            hostname: entry.hostname,
            platform: entry.platform,
            user_id: entry.user_id,
            collection_id: entry.collection_id,
            status: entry.status,
            created_at: Utc::now(),
        };
        state.entries.insert(key, stored.clone());
        Ok(Registration::Created(stored))
    }

    async fn list_in_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<DeviceEntry>, RepositoryError> {
        let state = self.available()?;
        let mut entries: Vec<DeviceEntry> = state
            .entries
            .values()
            .filter(|e| e.collection_id == collection_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.row_id);
        Ok(entries)
    }
}
