// Terminal handlers behind the request pipeline

pub mod download;
pub mod upload;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Plaintext failure body. In legacy mode the status is always 200.
pub(crate) fn failure(
    state: &AppState,
    status: StatusCode,
    message: impl Into<String>,
) -> Response {
    let status = if state.legacy_status_codes {
        StatusCode::OK
    } else {
        status
    };
    (status, message.into()).into_response()
}

/// Fallback for unknown routes
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found")
}
