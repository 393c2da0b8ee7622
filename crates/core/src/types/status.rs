//! Device presence status.

use serde::{Deserialize, Serialize};

/// Presence state of an address book entry.
///
/// Entries are registered `Offline`. Only the presence flow moves an entry
/// to `Online`; registration never does. Stored as `SMALLINT` (`0`/`1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum DeviceStatus {
    #[default]
    Offline = 0,
    Online = 1,
}

impl DeviceStatus {
    /// Get the stored integer code.
    #[must_use]
    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Decode a stored integer code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Offline),
            1 => Some(Self::Online),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::Online => write!(f, "online"),
        }
    }
}
