//! Address book entry types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use peerbook_core::{
    CollectionId, DeviceId, DeviceStatus, EntryId, Hostname, Platform, UserId,
};

/// A device registered in a user's address book (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceEntry {
    /// Storage row ID.
    pub row_id: EntryId,
    /// Client-supplied device identifier, unique per user.
    pub device_id: DeviceId,
    /// Display name the device reported, if any.
    pub hostname: Option<Hostname>,
    /// Reported platform, if any.
    pub platform: Option<Platform>,
    /// User whose address book holds the entry.
    pub user_id: UserId,
    /// Date bucket the entry was filed under.
    pub collection_id: CollectionId,
    /// Presence state.
    pub status: DeviceStatus,
    /// When the entry was registered.
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeviceEntry {
    pub device_id: DeviceId,
    pub hostname: Option<Hostname>,
    pub platform: Option<Platform>,
    pub user_id: UserId,
    pub collection_id: CollectionId,
    pub status: DeviceStatus,
}

/// Result of an insert guarded by the (user, device) uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// This call stored the entry.
    Created(DeviceEntry),
    /// An entry for the same (user, device) already existed, possibly
    /// inserted by a concurrent report.
    AlreadyRegistered,
}
