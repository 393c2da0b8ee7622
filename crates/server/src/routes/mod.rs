//! HTTP route handlers for the address book API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                            - Liveness check
//! GET  /health/ready                                      - Readiness check
//!
//! # Client reports
//! POST /api/client/first_install                          - Register a freshly installed device
//!
//! # Address book
//! GET  /api/address_book/{user_id}/collections            - Date buckets, newest first
//! GET  /api/address_book/{user_id}/collections/{label}/devices - Devices in one bucket
//! ```
//!
//! Every `/api` response uses the [`crate::response::ApiResponse`] envelope.

pub mod address_book;
pub mod health;
pub mod report;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the `/api` router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/client/first_install", post(report::first_install))
        .route(
            "/address_book/{user_id}/collections",
            get(address_book::list_collections),
        )
        .route(
            "/address_book/{user_id}/collections/{label}/devices",
            get(address_book::list_devices),
        )
}

/// Create the main router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}
