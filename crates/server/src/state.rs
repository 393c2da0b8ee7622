//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::Storage;
use crate::services::ReportIngestor;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// storage and the ingestion service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    storage: Storage,
    ingestor: ReportIngestor,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `storage` - Storage seams used by the read endpoints
    /// * `ingestor` - Service handling first-install reports
    /// * `pool` - `PostgreSQL` pool probed by the readiness check, if any
    #[must_use]
    pub fn new(storage: Storage, ingestor: ReportIngestor, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                storage,
                ingestor,
                pool,
            }),
        }
    }

    /// Get a reference to the storage seams.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }

    /// Get a reference to the report ingestion service.
    #[must_use]
    pub fn ingestor(&self) -> &ReportIngestor {
        &self.inner.ingestor
    }

    /// Get a reference to the database connection pool, if one backs storage.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
