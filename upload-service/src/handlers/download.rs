use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

use super::failure;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    pub path: String,
}

/// Handle file download
///
/// Proxies the object body as-is, without a content type.
pub async fn download(
    State(state): State<AppState>,
    params: Result<Query<DownloadParams>, QueryRejection>,
) -> Response {
    let path = params.map(|Query(params)| params.path).unwrap_or_default();
    let not_downloaded = |status| {
        failure(
            &state,
            status,
            format!("Could not download file {} from S3", path),
        )
    };

    if path.is_empty() {
        tracing::warn!("Download rejected: missing path");
        return not_downloaded(StatusCode::BAD_REQUEST);
    }

    match state.bridge.get(&path).await {
        Ok(data) => {
            tracing::info!(path = %path, size = data.len(), "File downloaded");
            Response::new(Body::from(data))
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path, "Failed to download file from S3");
            not_downloaded(StatusCode::BAD_GATEWAY)
        }
    }
}
