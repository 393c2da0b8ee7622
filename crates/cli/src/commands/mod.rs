//! CLI command implementations.

pub mod list;
pub mod migrate;
pub mod report;
pub mod users;

use sqlx::PgPool;
use thiserror::Error;

use peerbook_core::UserId;
use peerbook_server::config::{ConfigError, ServerConfig};
use peerbook_server::db::{self, RepositoryError};
use peerbook_server::services::IngestError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A storage call failed.
    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),

    /// The report was rejected.
    #[error("Report failed: {0}")]
    Ingest(#[from] IngestError),

    /// No user with this ID.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Username already taken.
    #[error("User already exists with username: {0}")]
    UserExists(String),

    /// A command argument could not be parsed.
    #[error("Invalid {0}: {1}")]
    InvalidArgument(&'static str, String),
}

/// Load configuration and open a pool sized for one-shot commands.
async fn connect() -> Result<(ServerConfig, PgPool), CommandError> {
    let config = ServerConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, 2).await?;

    Ok((config, pool))
}
