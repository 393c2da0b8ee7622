//! User directory types.

use peerbook_core::UserId;

/// A user as seen through the directory.
///
/// Ingestion only cares that the user exists; the username is carried for
/// logs and CLI output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name in the account system.
    pub username: String,
}
