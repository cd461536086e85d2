//! Standard response envelope helpers.
//!
//! Every body is `{success, message, data?}` on success and
//! `{success: false, message, serverMessage}` on failure.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Success<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub success: bool,
    pub message: String,
    pub server_message: Option<String>,
}

pub fn success<T: Serialize>(data: T, message: impl Into<String>, status: StatusCode) -> (StatusCode, Json<Success<T>>) {
    (
        status,
        Json(Success {
            success: true,
            message: message.into(),
            data: Some(data),
        }),
    )
}

/// Success without a `data` member.
pub fn success_message(message: impl Into<String>, status: StatusCode) -> (StatusCode, Json<Success<()>>) {
    (
        status,
        Json(Success {
            success: true,
            message: message.into(),
            data: None,
        }),
    )
}

/// Failure envelope. Server-side failures are logged with their cause.
pub fn error(message: impl Into<String>, internal: Option<String>, status: StatusCode) -> (StatusCode, Json<Failure>) {
    let message = message.into();
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), cause = ?internal, "{}", message);
    } else {
        tracing::warn!(status = status.as_u16(), cause = ?internal, "{}", message);
    }
    (
        status,
        Json(Failure {
            success: false,
            message,
            server_message: internal,
        }),
    )
}
