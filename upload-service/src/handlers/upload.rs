use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use super::failure;
use crate::AppState;

/// Maximum size of the whole multipart body
pub const MAX_UPLOAD_BYTES: usize = 1_000_000;

const FILE_FIELD: &str = "file";

/// A file pulled out of the multipart form
#[derive(Debug)]
struct UploadedFile {
    filename: String,
    data: Bytes,
}

#[derive(Debug)]
enum FormError {
    TooLarge,
    Malformed(String),
    MissingFile,
}

/// Handle file upload
///
/// Reads the whole form (bounded by the route's body limit) before touching
/// storage, so an oversized request never reaches the bucket.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let file = match multipart {
        Ok(mut multipart) => read_file_field(&mut multipart).await,
        Err(rejection) => Err(FormError::Malformed(rejection.body_text())),
    };

    let file = match file {
        Ok(file) => file,
        Err(FormError::TooLarge) => {
            tracing::warn!(limit = MAX_UPLOAD_BYTES, "Upload rejected: body too large");
            return failure(
                &state,
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Image too large. Max Size: {}", MAX_UPLOAD_BYTES),
            );
        }
        Err(FormError::Malformed(reason)) => {
            tracing::warn!(reason = %reason, "Upload rejected: invalid multipart form");
            return failure(&state, StatusCode::BAD_REQUEST, "Could not parse upload form");
        }
        Err(FormError::MissingFile) => {
            tracing::warn!("Upload rejected: no {} field", FILE_FIELD);
            return failure(&state, StatusCode::BAD_REQUEST, "Could not get uploaded file");
        }
    };

    tracing::info!(
        filename = %file.filename,
        size = file.data.len(),
        "File received"
    );

    let size = file.data.len() as u64;
    match state.bridge.put(file.data, &file.filename, size).await {
        Ok(key) => {
            (StatusCode::OK, format!("Image uploaded successfully: {}", key)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, filename = %file.filename, "Failed to upload file to S3");
            failure(&state, StatusCode::BAD_GATEWAY, "Could not upload file")
        }
    }
}

/// Drain every field, keeping the first file part named `file`. A part
/// without a filename is a plain form value and never counts as the upload.
async fn read_file_field(multipart: &mut Multipart) -> Result<UploadedFile, FormError> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let filename = match field.file_name() {
            Some(name) if file.is_none() && field.name() == Some(FILE_FIELD) => {
                Some(name.to_string())
            }
            _ => None,
        };
        let data = field.bytes().await.map_err(form_error)?;

        if let Some(filename) = filename {
            file = Some(UploadedFile { filename, data });
        }
    }

    file.ok_or(FormError::MissingFile)
}

fn form_error(err: MultipartError) -> FormError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FormError::TooLarge
    } else {
        FormError::Malformed(err.body_text())
    }
}
