use std::io;

use axum::{
    Json,
    body::Body,
    extract::{Path, State, multipart::Field, Multipart},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt, channel::mpsc};
use uuid::Uuid;

use crate::{
    adapters::inbound::http::{
        dto::{ErrorResponseDto, FileDto, ListFilesResponseDto},
        error::{ApiError, api_error, bad_request},
        extract::declared_size,
        router::AppState,
    },
    domain::models::{DEFAULT_CONTENT_TYPE, FileMetadata, Principal, UploadRequest},
};

/// Multipart field carrying the payload
pub const UPLOAD_FIELD: &str = "file";

/// Response header carrying the stored sha256
pub const CHECKSUM_HEADER: &str = "x-checksum-sha256";

/// Chunks buffered between the multipart reader and the object store
const UPLOAD_CHANNEL_DEPTH: usize = 8;

/// Handle a streamed multipart upload
pub async fn upload_file(
    State(app_state): State<AppState>,
    principal: Principal,
    Path(bucket_id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileDto>), ApiError> {
    let declared = declared_size(&headers);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let stored = stream_field(&app_state, principal.user_id, bucket_id, declared, field).await?;
        return Ok((StatusCode::CREATED, Json(stored.into())));
    }

    Err(bad_request("multipart field 'file' is required"))
}

/// Pump one multipart field into the file service without buffering it
async fn stream_field(
    app_state: &AppState,
    owner_id: Uuid,
    bucket_id: Uuid,
    declared: u64,
    mut field: Field<'_>,
) -> Result<FileMetadata, ApiError> {
    let (mut tx, rx) = mpsc::channel::<io::Result<Bytes>>(UPLOAD_CHANNEL_DEPTH);

    let request = UploadRequest::builder()
        .owner_id(owner_id)
        .bucket_id(bucket_id)
        .body(rx.boxed())
        .declared_size(declared)
        .maybe_filename(field.file_name().map(str::to_string))
        .maybe_content_type(field.content_type().map(str::to_string))
        .build();

    let pump = async move {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    // receiver dropped: the upload already failed
                    if tx.send(Ok(chunk)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(io::Error::other(e))).await;
                    break;
                }
            }
        }
    };

    let ((), result) = tokio::join!(pump, app_state.file_service.upload(request));
    result.map_err(api_error)
}

pub async fn list_files(
    State(app_state): State<AppState>,
    principal: Principal,
    Path(bucket_id): Path<Uuid>,
) -> Result<Json<ListFilesResponseDto>, ApiError> {
    let files = app_state
        .file_service
        .list_files(principal.user_id, bucket_id)
        .await
        .map_err(api_error)?;

    let files: Vec<FileDto> = files.into_iter().map(FileDto::from).collect();
    Ok(Json(ListFilesResponseDto {
        total_count: files.len(),
        files,
    }))
}

/// Handle file download as a streamed body
pub async fn download_file(
    State(app_state): State<AppState>,
    principal: Principal,
    Path((bucket_id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<Response<Body>, ApiError> {
    let download = app_state
        .file_service
        .download(principal.user_id, bucket_id, file_id)
        .await
        .map_err(api_error)?;
    let metadata = download.metadata;

    let content_type = HeaderValue::from_str(&metadata.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, metadata.size_bytes)
        .header(CHECKSUM_HEADER, metadata.checksum.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            attachment_disposition(&metadata.original_filename),
        )
        .body(Body::from_stream(download.body))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponseDto::internal_error(&format!(
                    "failed to build response: {}",
                    e
                ))),
            )
        })
}

pub async fn delete_file(
    State(app_state): State<AppState>,
    principal: Principal,
    Path((bucket_id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .file_service
        .delete_file(principal.user_id, bucket_id, file_id)
        .await
        .map_err(api_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// `Content-Disposition` value with a header-safe filename
fn attachment_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}
