//! Address book entries backed by `peerbook.device_entry`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use peerbook_core::{
    CollectionId, DeviceId, DeviceStatus, EntryId, Hostname, Platform, UserId,
};

use super::{DeviceRegistry, RepositoryError};
use crate::models::{DeviceEntry, NewDeviceEntry, Registration};

#[derive(sqlx::FromRow)]
struct EntryRow {
    row_id: EntryId,
    device_id: String,
    hostname: Option<String>,
    platform: Option<String>,
    user_id: UserId,
    collection_id: CollectionId,
    status: i16,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for DeviceEntry {
    type Error = RepositoryError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let device_id = DeviceId::parse(&row.device_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid device id in database: {e}"))
        })?;
        let hostname = Hostname::parse_optional(row.hostname.as_deref()).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid hostname in database: {e}"))
        })?;
        let status = DeviceStatus::from_code(row.status).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("invalid device status code: {}", row.status))
        })?;

        Ok(Self {
            row_id: row.row_id,
            device_id,
            hostname,
            platform: Platform::parse_lenient(row.platform.as_deref()),
            user_id: row.user_id,
            collection_id: row.collection_id,
            status,
            created_at: row.created_at,
        })
    }
}

/// `PostgreSQL` device entry store.
#[derive(Clone)]
pub struct PgDeviceStore {
    pool: PgPool,
}

impl PgDeviceStore {
    /// Create a new device entry store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for PgDeviceStore {
    async fn exists(
        &self,
        user_id: UserId,
        device_id: &DeviceId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM peerbook.device_entry
                WHERE user_id = $1 AND device_id = $2
            )
            ",
        )
        .bind(user_id)
        .bind(device_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, entry: NewDeviceEntry) -> Result<Registration, RepositoryError> {
        // DO NOTHING returns no row when another report got there first
        let row = sqlx::query_as::<_, EntryRow>(
            r"
            INSERT INTO peerbook.device_entry
                (device_id, hostname, platform, user_id, collection_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, device_id) DO NOTHING
            RETURNING row_id, device_id, hostname, platform, user_id,
                      collection_id, status, created_at
            ",
        )
        .bind(entry.device_id.as_str())
        .bind(entry.hostname.as_ref().map(Hostname::as_str))
        .bind(entry.platform.map(Platform::as_str))
        .bind(entry.user_id)
        .bind(entry.collection_id)
        .bind(entry.status.code())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Registration::Created(r.try_into()?)),
            None => Ok(Registration::AlreadyRegistered),
        }
    }

    async fn list_in_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<DeviceEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r"
            SELECT row_id, device_id, hostname, platform, user_id,
                   collection_id, status, created_at
            FROM peerbook.device_entry
            WHERE collection_id = $1
            ORDER BY created_at ASC, row_id ASC
            ",
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeviceEntry::try_from).collect()
    }
}
