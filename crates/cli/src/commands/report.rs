//! Submit a first-install report from the command line.
//!
//! Runs the same ingestion as `POST /api/client/first_install`, which is
//! handy for backfilling devices and for checking a deployment by hand.
//!
//! # Usage
//!
//! ```bash
//! peerbook report --user 42 --device dev-1 --hostname h1 --platform linux
//! ```

use peerbook_server::db::Storage;
use peerbook_server::services::{FirstInstallReport, IngestOutcome, ReportIngestor};

use super::{CommandError, connect};

/// Ingest one report and log what happened.
///
/// # Errors
///
/// Returns `CommandError::Ingest` if the report is invalid, the user does
/// not exist, or storage fails.
pub async fn submit(
    user_id: i64,
    device_id: String,
    hostname: Option<String>,
    platform: Option<String>,
) -> Result<(), CommandError> {
    let (config, pool) = connect().await?;
    let storage = Storage::postgres(&pool);
    let ingestor = ReportIngestor::from_storage(&storage, config.reference_zone);

    let report = FirstInstallReport {
        client_id: Some(device_id),
        hostname,
        platform,
        target_user_id: Some(user_id),
    };

    match ingestor.ingest(&report).await? {
        IngestOutcome::Created { entry, collection } => {
            tracing::info!(
                "Device {} added to user {} under {} (collection {})",
                entry.device_id.as_str(),
                entry.user_id,
                collection.label,
                collection.id
            );
        }
        IngestOutcome::AlreadyRegistered => {
            tracing::info!("Device already registered for user {}", user_id);
        }
    }

    Ok(())
}
