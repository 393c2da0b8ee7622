//! Integration tests for Peerbook.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory storage only
//! cargo test -p peerbook-integration-tests
//!
//! # Also exercise PostgreSQL (the database is migrated on first use)
//! PEERBOOK_TEST_DATABASE_URL=postgres://localhost/peerbook_test \
//!     cargo test -p peerbook-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `first_install` - Report endpoint codes, statuses, and idempotence
//! - `address_book` - Read endpoints
//! - `concurrency` - Bursts of reports against one user-day
//! - `postgres` - Storage seams against a real database

#![allow(clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use sqlx::PgPool;

use peerbook_core::{ReferenceZone, UserId};
use peerbook_server::clock::FixedClock;
use peerbook_server::db::{MemoryStore, Storage};
use peerbook_server::services::ReportIngestor;
use peerbook_server::state::AppState;

/// Environment variable holding the test database URL.
pub const TEST_DATABASE_URL: &str = "PEERBOOK_TEST_DATABASE_URL";

/// User seeded into every in-memory context.
pub const SEEDED_USER: UserId = UserId::new(42);

/// 2024-01-01 09:00 at UTC+8.
#[must_use]
pub fn new_year_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// An in-memory server whose clock is pinned to one instant.
pub struct TestContext {
    pub store: MemoryStore,
    pub router: Router,
}

impl TestContext {
    /// Build a context with [`SEEDED_USER`] in the directory.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        let store = MemoryStore::new();
        store.add_user(SEEDED_USER, "alice");
        Self::with_store(store, now)
    }

    /// Build a context over an existing store, e.g. to replay a later day.
    #[must_use]
    pub fn with_store(store: MemoryStore, now: DateTime<Utc>) -> Self {
        let storage = Storage::in_memory(&store);
        let ingestor = ReportIngestor::from_storage(&storage, ReferenceZone::default())
            .with_clock(Arc::new(FixedClock(now)));
        let router = peerbook_server::app(AppState::new(storage, ingestor, None));

        Self { store, router }
    }

    /// Serve the router on an ephemeral local port.
    ///
    /// Returns the base URL, e.g. `http://127.0.0.1:54321`.
    pub async fn serve(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let router = self.router.clone();

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test server");
        });

        format!("http://{addr}")
    }
}

/// A first-install report body for `device` and `user`.
#[must_use]
pub fn report_body(device: &str, user: i64) -> Value {
    serde_json::json!({
        "client_id": device,
        "hostname": "h1",
        "platform": "linux",
        "target_user_id": user,
    })
}

/// Connect to the test database and apply migrations.
///
/// Returns `None` when [`TEST_DATABASE_URL`] is unset so that callers can
/// skip.
pub async fn test_pool() -> Option<PgPool> {
    let url = std::env::var(TEST_DATABASE_URL).ok()?;

    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("apply migrations");

    Some(pool)
}

/// A username no other test run has used.
#[must_use]
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}
