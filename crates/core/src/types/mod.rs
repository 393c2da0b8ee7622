//! Core types for Peerbook.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod date;
pub mod device;
pub mod id;
pub mod status;

pub use date::{DateLabel, DateLabelError, ReferenceZone, ReferenceZoneError};
pub use device::{DeviceId, DeviceIdError, Hostname, HostnameError, Platform};
pub use id::*;
pub use status::DeviceStatus;
