use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";
const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
    pub file_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: &'static str,
}

/// Streams the first `file` part of a multipart body to the file store.
/// Other parts, and `file` parts without a filename, are ignored.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let file_type = field
            .content_type()
            .unwrap_or(DEFAULT_FILE_TYPE)
            .to_string();

        let chunks = Box::pin(field.map(|chunk| chunk.map_err(multipart_error)));
        let stored = state.files.save_upload(chunks, &file_name).await?;
        info!("upload {} stored as {}", file_name, stored.file_name);

        return Ok(Json(UploadResponse {
            success: true,
            url: stored.url,
            file_name,
            file_type,
        }));
    }

    warn!("no file in upload request");
    Err(AppError::Validation("No file uploaded".to_string()))
}

pub async fn upload_url() -> Json<UploadUrlResponse> {
    Json(UploadUrlResponse {
        upload_url: "/api/upload",
    })
}

pub async fn serve_upload(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    let upload = state
        .files
        .resolve_upload(&file_name)
        .await?
        .ok_or(AppError::NotFound)?;
    let mime = mime_guess::from_path(&file_name).first_or_octet_stream();

    let headers = [
        (header::CONTENT_TYPE, mime.to_string()),
        (header::CONTENT_LENGTH, upload.len.to_string()),
    ];
    let body = Body::from_stream(ReaderStream::new(upload.file));

    Ok((headers, body).into_response())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(err.body_text())
    }
}
