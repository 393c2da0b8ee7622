//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that reports server-side errors before
//! responding to the client. All route handlers should return
//! `Result<T, AppError>`.
//!
//! A server-side error is logged once at ERROR level with the error attached;
//! the Sentry tracing layer turns that event into the exception report.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use peerbook_core::UserId;

use crate::db::RepositoryError;
use crate::response::{ApiResponse, codes};
use crate::services::{IngestError, ValidationErrors};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request fields are missing or malformed.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// The referenced user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Storage operation failed.
    #[error("Operation failed: {0}")]
    OperationFailed(#[from] RepositoryError),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(errors) => Self::Validation(errors),
            IngestError::UserNotFound(id) => Self::UserNotFound(id),
            IngestError::OperationFailed(e) => Self::OperationFailed(e),
        }
    }
}

impl AppError {
    /// Shorthand for a validation failure on one field.
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Report server errors; one ERROR event becomes one Sentry event
        if matches!(self, Self::OperationFailed(_)) {
            tracing::error!(
                error = &self as &dyn std::error::Error,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        match self {
            Self::Validation(errors) => ApiResponse::fail(
                codes::VALIDATION_ERROR,
                format!("Invalid request: {errors}"),
                Some(json!({ "errors": errors })),
            )
            .with_status(StatusCode::BAD_REQUEST),
            Self::UserNotFound(id) => {
                ApiResponse::<()>::fail(codes::USER_NOT_FOUND, format!("User {id} not found"), None)
                    .with_status(StatusCode::NOT_FOUND)
            }
            Self::OperationFailed(_) => ApiResponse::<()>::fail(
                codes::OPERATION_FAILED,
                "Operation failed, please try again later",
                None,
            )
            .with_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for API actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}
