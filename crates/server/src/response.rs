//! JSON response envelope shared by every API endpoint.
//!
//! ```json
//! {"code": 0, "message": "Device added to address book", "data": {...}}
//! ```
//!
//! `code` is `0` on success. Failures use the codes in [`codes`] so clients
//! can tell "fix your request" apart from "try again later" without parsing
//! messages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Application-level result codes.
pub mod codes {
    /// Success.
    pub const OK: i32 = 0;
    /// Malformed or missing request fields.
    pub const VALIDATION_ERROR: i32 = 101;
    /// The referenced user does not exist.
    pub const USER_NOT_FOUND: i32 = 102;
    /// Storage failed; resend the request later.
    pub const OPERATION_FAILED: i32 = 103;
}

/// Body of every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A success envelope carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: codes::OK,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A failure envelope.
    pub fn fail(code: i32, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// Pair the envelope with an HTTP status.
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
