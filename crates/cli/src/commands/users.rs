//! User directory commands.
//!
//! # Usage
//!
//! ```bash
//! peerbook user add --username alice
//! ```

use peerbook_core::UserId;
use peerbook_server::db::PgUserDirectory;

use super::{CommandError, connect};

/// Add a user to the directory.
///
/// # Returns
///
/// The ID of the created user, to be used as `target_user_id` in reports.
///
/// # Errors
///
/// Returns `CommandError::UserExists` if the username is taken, or a
/// connection/storage error.
pub async fn add(username: &str) -> Result<UserId, CommandError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CommandError::InvalidArgument(
            "username",
            "must not be empty".to_owned(),
        ));
    }

    let (_config, pool) = connect().await?;
    let directory = PgUserDirectory::new(pool);

    tracing::info!("Creating user: {}", username);
    let user = directory
        .create(username)
        .await?
        .ok_or_else(|| CommandError::UserExists(username.to_owned()))?;

    tracing::info!(
        "User created successfully! ID: {}, Username: {}",
        user.id,
        user.username
    );

    Ok(user.id)
}
