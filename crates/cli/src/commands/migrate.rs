//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! peerbook migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PEERBOOK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded into the
//! binary at compile time.

use super::{CommandError, connect};

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let (_config, pool) = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
