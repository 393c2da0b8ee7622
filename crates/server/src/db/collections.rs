//! Date bucket storage backed by `peerbook.collection`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use peerbook_core::{CollectionId, DateLabel, UserId};

use super::{CollectionProvisioner, RepositoryError};
use crate::models::{Collection, CollectionSummary};

#[derive(sqlx::FromRow)]
struct CollectionRow {
    id: CollectionId,
    user_id: UserId,
    label: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CollectionRow> for Collection {
    type Error = RepositoryError;

    fn try_from(row: CollectionRow) -> Result<Self, Self::Error> {
        let label = DateLabel::parse(&row.label).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid collection label in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            label,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    collection: CollectionRow,
    device_count: i64,
}

/// `PostgreSQL` collection store.
#[derive(Clone)]
pub struct PgCollectionStore {
    pool: PgPool,
}

impl PgCollectionStore {
    /// Create a new collection store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CollectionProvisioner for PgCollectionStore {
    async fn get_or_create(
        &self,
        user_id: UserId,
        label: DateLabel,
    ) -> Result<Collection, RepositoryError> {
        // The no-op DO UPDATE makes RETURNING yield the existing row on
        // conflict, so concurrent callers all get the same bucket back.
        let row = sqlx::query_as::<_, CollectionRow>(
            r"
            INSERT INTO peerbook.collection (user_id, label)
            VALUES ($1, $2)
            ON CONFLICT (user_id, label) DO UPDATE SET label = EXCLUDED.label
            RETURNING id, user_id, label, created_at
            ",
        )
        .bind(user_id)
        .bind(label.to_string())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find(
        &self,
        user_id: UserId,
        label: DateLabel,
    ) -> Result<Option<Collection>, RepositoryError> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r"
            SELECT id, user_id, label, created_at
            FROM peerbook.collection
            WHERE user_id = $1 AND label = $2
            ",
        )
        .bind(user_id)
        .bind(label.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Collection::try_from).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CollectionSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT c.id, c.user_id, c.label, c.created_at,
                   COUNT(d.row_id) AS device_count
            FROM peerbook.collection c
            LEFT JOIN peerbook.device_entry d ON d.collection_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.label DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(CollectionSummary {
                    collection: r.collection.try_into()?,
                    device_count: r.device_count,
                })
            })
            .collect()
    }
}
