//! Client report route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Serialize;
use tracing::instrument;

use peerbook_core::{CollectionId, DateLabel};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::DeviceEntry;
use crate::response::ApiResponse;
use crate::services::{FirstInstallReport, IngestOutcome};
use crate::state::AppState;

/// Payload returned when a report registered a new device.
#[derive(Debug, Serialize)]
pub struct RegisteredDevice {
    pub outcome: &'static str,
    pub collection_id: CollectionId,
    pub label: DateLabel,
    pub entry: DeviceEntry,
}

/// Payload returned when the device was already in the address book.
#[derive(Debug, Serialize)]
pub struct AlreadyRegistered {
    pub outcome: &'static str,
}

/// Handle a first-install report.
///
/// Responds `201 Created` when the device was added, and `200 OK` when it was
/// already present. Both are successes; a client may resend the same report
/// any number of times.
#[instrument(skip(state, body))]
pub async fn first_install(
    State(state): State<AppState>,
    body: std::result::Result<Json<FirstInstallReport>, JsonRejection>,
) -> Result<Response> {
    let Json(report) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected report body");
        AppError::invalid_field("body", rejection.body_text())
    })?;

    add_breadcrumb(
        "report",
        "First-install report received",
        &[
            (
                "client_id",
                report.client_id.clone().unwrap_or_default(),
            ),
            (
                "target_user_id",
                report
                    .target_user_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            ),
        ],
    );

    let response = match state.ingestor().ingest(&report).await? {
        IngestOutcome::Created { entry, collection } => ApiResponse::ok(
            "Device added to address book",
            RegisteredDevice {
                outcome: "created",
                collection_id: collection.id,
                label: collection.label,
                entry,
            },
        )
        .with_status(StatusCode::CREATED),
        IngestOutcome::AlreadyRegistered => ApiResponse::ok(
            "Device already registered",
            AlreadyRegistered {
                outcome: "already_registered",
            },
        )
        .with_status(StatusCode::OK),
    };

    Ok(response)
}
