//! Print a user's address book.
//!
//! # Usage
//!
//! ```bash
//! # Date buckets, newest first
//! peerbook list --user 42
//!
//! # Devices registered on one day
//! peerbook list --user 42 --label 2024-01-01
//! ```

use peerbook_core::{DateLabel, UserId};
use peerbook_server::db::Storage;

use super::{CommandError, connect};

/// List buckets, or the devices in one bucket when `label` is given.
///
/// # Errors
///
/// Returns an error if the label is malformed, the user does not exist, or
/// storage fails.
#[allow(clippy::print_stdout)]
pub async fn run(user_id: i64, label: Option<&str>) -> Result<(), CommandError> {
    let user_id = UserId::new(user_id);
    let label = label
        .map(DateLabel::parse)
        .transpose()
        .map_err(|e| CommandError::InvalidArgument("label", e.to_string()))?;

    let (_config, pool) = connect().await?;
    let storage = Storage::postgres(&pool);

    let user = storage
        .users
        .resolve(user_id)
        .await?
        .ok_or(CommandError::UserNotFound(user_id))?;

    match label {
        None => {
            let collections = storage.collections.list_for_user(user.id).await?;
            println!("{} ({}): {} collection(s)", user.username, user.id, collections.len());
            for summary in collections {
                println!(
                    "  {}  id={}  devices={}",
                    summary.collection.label, summary.collection.id, summary.device_count
                );
            }
        }
        Some(label) => {
            let devices = match storage.collections.find(user.id, label).await? {
                Some(collection) => storage.devices.list_in_collection(collection.id).await?,
                None => Vec::new(),
            };
            println!("{} ({}) on {}: {} device(s)", user.username, user.id, label, devices.len());
            for entry in devices {
                println!(
                    "  {}  hostname={}  platform={}  status={:?}",
                    entry.device_id.as_str(),
                    entry.hostname.as_ref().map_or("-", |h| h.as_str()),
                    entry.platform.map_or("-", |p| p.as_str()),
                    entry.status
                );
            }
        }
    }

    Ok(())
}
