//! Address book read route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use peerbook_core::{DateLabel, UserId};

use crate::error::{AppError, Result};
use crate::models::{CollectionSummary, DeviceEntry, User};
use crate::response::ApiResponse;
use crate::state::AppState;

/// A user's date buckets.
#[derive(Debug, Serialize)]
pub struct CollectionList {
    pub user_id: UserId,
    pub collections: Vec<CollectionSummary>,
}

/// The devices filed under one date bucket.
#[derive(Debug, Serialize)]
pub struct DeviceList {
    pub user_id: UserId,
    pub label: DateLabel,
    pub devices: Vec<DeviceEntry>,
}

fn parse_user_id(raw: &str) -> Result<UserId> {
    raw.parse::<i64>()
        .ok()
        .map(UserId::new)
        .filter(UserId::is_positive)
        .ok_or_else(|| AppError::invalid_field("user_id", "must be a positive integer"))
}

async fn resolve_user(state: &AppState, user_id: UserId) -> Result<User> {
    state
        .storage()
        .users
        .resolve(user_id)
        .await?
        .ok_or(AppError::UserNotFound(user_id))
}

/// List a user's date buckets, newest first, with device counts.
#[instrument(skip(state))]
pub async fn list_collections(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<CollectionList>>> {
    let user = resolve_user(&state, parse_user_id(&user_id)?).await?;

    let collections = state.storage().collections.list_for_user(user.id).await?;

    Ok(Json(ApiResponse::ok(
        "ok",
        CollectionList {
            user_id: user.id,
            collections,
        },
    )))
}

/// List the devices in one of a user's date buckets, oldest first.
///
/// A label with no bucket yields an empty list.
#[instrument(skip(state))]
pub async fn list_devices(
    State(state): State<AppState>,
    Path((user_id, label)): Path<(String, String)>,
) -> Result<Json<ApiResponse<DeviceList>>> {
    let user_id = parse_user_id(&user_id)?;
    let label =
        DateLabel::parse(&label).map_err(|e| AppError::invalid_field("label", e.to_string()))?;
    let user = resolve_user(&state, user_id).await?;

    let devices = match state.storage().collections.find(user.id, label).await? {
        Some(collection) => {
            state
                .storage()
                .devices
                .list_in_collection(collection.id)
                .await?
        }
        None => Vec::new(),
    };

    Ok(Json(ApiResponse::ok(
        "ok",
        DeviceList {
            user_id: user.id,
            label,
            devices,
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("42").ok(), Some(UserId::new(42)));
        assert!(parse_user_id("0").is_err());
        assert!(parse_user_id("-3").is_err());
        assert!(parse_user_id("abc").is_err());
    }
}
