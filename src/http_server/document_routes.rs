//! Document HTTP Routes
//!
//! Upload, download, overwrite and delete documents by id.

use std::io::Read;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use crate::document_store::{DocumentError, DocumentResult, StorageEngine};

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

// ==================
// Shared State
// ==================

/// Document state shared across handlers
pub struct DocumentState {
    pub engine: Arc<StorageEngine>,
    pub max_upload_bytes: usize,
}

impl DocumentState {
    pub fn new(engine: Arc<StorageEngine>, max_upload_bytes: usize) -> Self {
        Self {
            engine,
            max_upload_bytes,
        }
    }
}

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
            code: status.as_u16(),
        }),
    )
}

fn document_error(e: &DocumentError) -> ApiError {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error(status, e.public_message())
}

// ==================
// Document Routes
// ==================

/// Create document routes
pub fn document_routes(state: Arc<DocumentState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/documents", post(create_document_handler))
        .route(
            "/documents/:doc_id",
            get(get_document_handler)
                .put(update_document_handler)
                .delete(delete_document_handler),
        )
        .layer(body_limit)
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Run a blocking engine call off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> DocumentResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(document_error(&e)),
        Err(e) => {
            error!(error = %e, "storage task failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal storage error",
            ))
        }
    }
}

/// Pull the `file` field out of a multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("unnamed").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))?;
        return Ok((file_name, data));
    }

    Err(api_error(StatusCode::BAD_REQUEST, "No file provided"))
}

/// Content type for a stored extension
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "htm" | "html" => "text/html",
        "md" => "text/markdown",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

/// `Content-Disposition` for a download named `file_name`
fn attachment_header(file_name: &str) -> HeaderValue {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", escaped))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

// ==================
// Document Handlers
// ==================

async fn create_document_handler(
    State(state): State<Arc<DocumentState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, String), ApiError> {
    let (file_name, data) = read_upload(&mut multipart).await?;

    let engine = Arc::clone(&state.engine);
    let id = run_blocking(move || {
        let mut reader: &[u8] = &data;
        engine.store(&file_name, &mut reader)
    })
    .await?;

    Ok((StatusCode::CREATED, id))
}

async fn get_document_handler(
    State(state): State<Arc<DocumentState>>,
    Path(doc_id): Path<String>,
) -> Result<(StatusCode, HeaderMap, Bytes), ApiError> {
    let engine = Arc::clone(&state.engine);
    let (record, data) = run_blocking(move || {
        let mut document = engine.load(&doc_id)?;
        let mut data = Vec::new();
        document.content.read_to_end(&mut data)?;
        Ok((document.record, data))
    })
    .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&record.extension)),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        attachment_header(&record.original_file_name()),
    );

    Ok((StatusCode::OK, headers, Bytes::from(data)))
}

async fn update_document_handler(
    State(state): State<Arc<DocumentState>>,
    Path(doc_id): Path<String>,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let (file_name, data) = read_upload(&mut multipart).await?;

    let engine = Arc::clone(&state.engine);
    run_blocking(move || {
        let mut reader: &[u8] = &data;
        engine.update(&doc_id, &file_name, &mut reader)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_document_handler(
    State(state): State<Arc<DocumentState>>,
    Path(doc_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let engine = Arc::clone(&state.engine);
    run_blocking(move || engine.delete(&doc_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
