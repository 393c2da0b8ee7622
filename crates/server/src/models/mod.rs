//! Domain models for the address book.
//!
//! These types represent validated domain objects separate from database row
//! types. Row structs live next to the queries in [`crate::db`].

pub mod collection;
pub mod device;
pub mod user;

pub use collection::{Collection, CollectionSummary};
pub use device::{DeviceEntry, NewDeviceEntry, Registration};
pub use user::User;
