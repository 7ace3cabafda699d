use crate::AppState;
use crate::api::models::files::{FileResponse, StatusResponse};
use crate::errors::{Error, Result};
use crate::storage::{FileStore, StoredFile, UploadStream};
use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartRejection},
    },
    http::StatusCode,
};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use std::io;
use tokio_util::io::StreamReader;

/// Multipart field carrying the uploaded file and its client-side file name
pub const UPLOAD_FIELD: &str = "file";

/// An upload held in memory until it has passed the size check
struct BufferedUpload {
    chunks: Vec<Bytes>,
    size: u64,
}

impl BufferedUpload {
    fn into_stream(self) -> UploadStream<'static> {
        let chunks = self.chunks.into_iter().map(Ok::<_, io::Error>);
        Box::pin(StreamReader::new(stream::iter(chunks)))
    }
}

async fn next_chunk(field: &mut Field<'_>) -> Result<Option<Bytes>> {
    field.chunk().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to read file chunk: {}", e),
    })
}

fn empty_file() -> Error {
    Error::BadRequest {
        message: "File cannot be empty".to_string(),
    }
}

/// Read the whole field, failing as soon as it grows past `max_file_size`
async fn buffer_upload(filename: &str, field: &mut Field<'_>, max_file_size: u64) -> Result<BufferedUpload> {
    let mut chunks = Vec::new();
    let mut size = 0u64;

    while let Some(chunk) = next_chunk(field).await? {
        size += chunk.len() as u64;

        // Check size limit incrementally to fail fast
        if size > max_file_size {
            tracing::warn!(
                filename = %filename,
                size = size,
                max_file_size = max_file_size,
                "File size limit exceeded, rejecting upload"
            );
            return Err(Error::BadRequest {
                message: format!(
                    "File size exceeds maximum allowed size of {} bytes ({} MB)",
                    max_file_size,
                    max_file_size / (1024 * 1024)
                ),
            });
        }

        chunks.push(chunk);
    }

    Ok(BufferedUpload { chunks, size })
}

/// Hand one `file` field to the store.
///
/// With a size limit the field is buffered so oversized uploads never reach the disk. Without
/// one (`max_file_size == 0`) it is streamed straight through, so memory use stays bounded.
async fn store_upload(store: &dyn FileStore, mut field: Field<'_>, max_file_size: u64) -> Result<StoredFile> {
    let filename = field.file_name().map(str::to_string).ok_or_else(|| Error::BadRequest {
        message: format!("Missing file name for field '{UPLOAD_FIELD}'"),
    })?;

    if max_file_size > 0 {
        let upload = buffer_upload(&filename, &mut field, max_file_size).await?;
        if upload.size == 0 {
            return Err(empty_file());
        }

        tracing::info!(filename = %filename, size = upload.size, "Storing uploaded file");
        return Ok(store.put(&filename, Some(upload.into_stream())).await?);
    }

    // Look at the first non-empty chunk so an empty upload is still rejected before the disk is touched
    let first = loop {
        match next_chunk(&mut field).await? {
            Some(chunk) if chunk.is_empty() => continue,
            Some(chunk) => break chunk,
            None => return Err(empty_file()),
        }
    };

    tracing::info!(filename = %filename, "Streaming uploaded file");

    let rest = field.map_err(io::Error::other);
    let content = stream::iter([Ok::<_, io::Error>(first)]).chain(rest);
    let reader: UploadStream<'_> = Box::pin(StreamReader::new(content));

    Ok(store.put(&filename, Some(reader)).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/files",
    tag = "files",
    summary = "Upload file",
    description = "Upload a file as multipart form data under the `file` field. \
                   The client-supplied file name is reduced to its final path segment; \
                   an existing file with that name is replaced.",
    request_body(
        content_type = "multipart/form-data",
        description = "Form with a single `file` part"
    ),
    responses(
        (status = 201, description = "File stored", body = FileResponse),
        (status = 400, description = "Malformed form, missing or empty file, invalid name, or file too large"),
        (status = 500, description = "Storage directory could not be written")
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<FileResponse>)> {
    let mut multipart = multipart.map_err(|e| Error::BadRequest {
        message: format!("Could not parse multipart form: {}", e.body_text()),
    })?;

    let max_file_size = state.config.limits.files.max_file_size;
    let mut stored: Option<StoredFile> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {}", e),
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            // Ignore unknown fields (forward compatibility)
            continue;
        }
        if stored.is_some() {
            tracing::debug!("Ignoring additional '{}' field", UPLOAD_FIELD);
            continue;
        }
        stored = Some(store_upload(state.store.as_ref(), field, max_file_size).await?);
    }

    let stored = stored.ok_or_else(|| Error::BadRequest {
        message: format!("Missing required field: '{UPLOAD_FIELD}'"),
    })?;

    Ok((StatusCode::CREATED, Json(stored.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "files",
    summary = "List files",
    description = "Returns every file directly inside the storage directory, in filesystem order. \
                   Subdirectories and unreadable entries are left out.",
    responses(
        (status = 200, description = "Stored files", body = [FileResponse]),
        (status = 500, description = "Storage directory could not be read")
    )
)]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileResponse>>> {
    let files = state.store.list().await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{name}",
    tag = "files",
    summary = "Delete file",
    description = "Delete a file by name. Directory components in the name are ignored.",
    responses(
        (status = 200, description = "File deleted", body = StatusResponse),
        (status = 400, description = "Missing or invalid file name"),
        (status = 404, description = "File not found"),
        (status = 500, description = "File could not be deleted")
    ),
    params(
        ("name" = String, Path, description = "Name of the file to delete")
    )
)]
pub async fn delete_file(State(state): State<AppState>, Path(name): Path<String>) -> Result<Json<StatusResponse>> {
    if name.is_empty() {
        return Err(missing_name());
    }

    state.store.delete(&name).await?;

    Ok(Json(StatusResponse::new("file deleted successfully")))
}

/// `DELETE /api/v1/files/` - the name segment is empty
pub async fn delete_file_without_name() -> Result<Json<StatusResponse>> {
    Err(missing_name())
}

fn missing_name() -> Error {
    Error::BadRequest {
        message: "File name is required".to_string(),
    }
}
