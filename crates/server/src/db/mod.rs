//! Storage for the date-bucketed address book.
//!
//! # Database schema: `peerbook`
//!
//! ## Tables
//!
//! - `user` - Directory of users that may own an address book
//! - `collection` - One date bucket per (user, label), unique on both
//! - `device_entry` - Registered devices, unique per (user, device id)
//!
//! # Seams
//!
//! Ingestion talks to storage through three traits so the same orchestration
//! runs against `PostgreSQL` in production and [`memory::MemoryStore`] in
//! tests. Every "exists, else create" step is a single atomic call on the
//! implementation; callers never check and then insert.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p peerbook-cli -- migrate
//! ```

pub mod collections;
pub mod devices;
pub mod memory;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use peerbook_core::{CollectionId, DateLabel, DeviceId, UserId};

use crate::models::{
    Collection, CollectionSummary, DeviceEntry, NewDeviceEntry, Registration, User,
};

pub use collections::PgCollectionStore;
pub use devices::PgDeviceStore;
pub use memory::MemoryStore;
pub use users::PgUserDirectory;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The backing store refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Resolves user ids against the account system.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user. `Ok(None)` means the user does not exist.
    async fn resolve(&self, user_id: UserId) -> Result<Option<User>, RepositoryError>;
}

/// Owns the per-user date buckets.
#[async_trait]
pub trait CollectionProvisioner: Send + Sync {
    /// Return the bucket for (`user_id`, `label`), creating it if needed.
    ///
    /// Concurrent calls for the same pair return the same collection.
    async fn get_or_create(
        &self,
        user_id: UserId,
        label: DateLabel,
    ) -> Result<Collection, RepositoryError>;

    /// Look up a bucket without creating it.
    async fn find(
        &self,
        user_id: UserId,
        label: DateLabel,
    ) -> Result<Option<Collection>, RepositoryError>;

    /// All buckets of a user, newest label first, with device counts.
    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CollectionSummary>, RepositoryError>;
}

/// Owns the address book entries.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Whether `device_id` is already in the user's address book.
    async fn exists(&self, user_id: UserId, device_id: &DeviceId)
    -> Result<bool, RepositoryError>;

    /// Insert an entry unless one already exists for (user, device).
    ///
    /// Losing a race to a concurrent insert yields
    /// [`Registration::AlreadyRegistered`], never an error.
    async fn create(&self, entry: NewDeviceEntry) -> Result<Registration, RepositoryError>;

    /// Entries filed under a collection, oldest first.
    async fn list_in_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<DeviceEntry>, RepositoryError>;
}

/// The three storage seams, bundled for wiring.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserDirectory>,
    pub collections: Arc<dyn CollectionProvisioner>,
    pub devices: Arc<dyn DeviceRegistry>,
}

impl Storage {
    /// All seams backed by one `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserDirectory::new(pool.clone())),
            collections: Arc::new(PgCollectionStore::new(pool.clone())),
            devices: Arc::new(PgDeviceStore::new(pool.clone())),
        }
    }

    /// All seams backed by one shared in-memory store.
    #[must_use]
    pub fn in_memory(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            collections: Arc::new(store.clone()),
            devices: Arc::new(store.clone()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
