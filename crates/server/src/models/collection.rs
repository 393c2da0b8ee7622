//! Date bucket types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use peerbook_core::{CollectionId, DateLabel, UserId};

/// A date bucket: the devices one user registered on one calendar day.
///
/// At most one exists per (`user_id`, `label`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    /// Unique collection ID.
    pub id: CollectionId,
    /// User who owns this bucket.
    pub user_id: UserId,
    /// Calendar day in the reference zone.
    pub label: DateLabel,
    /// When the bucket was first provisioned.
    pub created_at: DateTime<Utc>,
}

/// A collection together with how many devices it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    #[serde(flatten)]
    pub collection: Collection,
    pub device_count: i64,
}
