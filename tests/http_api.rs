//! Document HTTP API Tests
//!
//! Drives the full router in-process: upload, download, overwrite and
//! delete, plus the error statuses each route reports.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use docstore::document_store::{
    EngineConfig, InMemoryMetadataStore, LocalByteSink, MetadataStore, StorageEngine,
};
use docstore::http_server::{DocumentState, HttpServer, HttpServerConfig};

const BOUNDARY: &str = "docstore-test-boundary";

fn test_app(temp: &TempDir, max_upload_bytes: usize) -> Router {
    test_app_with_metadata(temp, max_upload_bytes).0
}

fn test_app_with_metadata(
    temp: &TempDir,
    max_upload_bytes: usize,
) -> (Router, Arc<InMemoryMetadataStore>) {
    let metadata = Arc::new(InMemoryMetadataStore::new());
    let engine = StorageEngine::new(
        EngineConfig::default(),
        metadata.clone(),
        Arc::new(LocalByteSink::new(temp.path().to_path_buf())),
    );
    let state = DocumentState::new(Arc::new(engine), max_upload_bytes);
    let router = HttpServer::new(HttpServerConfig::default(), state).router();
    (router, metadata)
}

fn multipart_body(field: &str, file_name: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match file_name {
        Some(name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
            field, name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n{}\r\n", BOUNDARY, disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(method: &str, uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn upload(app: &Router, file_name: &str, content: &[u8]) -> String {
    let response = app
        .clone()
        .oneshot(upload_request(
            "POST",
            "/storage/documents",
            multipart_body("file", Some(file_name), content),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    String::from_utf8(body_bytes(response).await).unwrap()
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn test_upload_then_download() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 1024 * 1024);

    let id = upload(&app, "Cool Dog.JPG", b"woof woof").await;
    assert_eq!(id.len(), 20);

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/storage/documents/{}", id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Cool Dog.jpg\""
    );
    assert_eq!(body_bytes(response).await, b"woof woof");
}

#[tokio::test]
async fn test_overwrite_then_download() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 1024 * 1024);
    let id = upload(&app, "gnome.jpg", b"jpeg").await;

    let response = app
        .clone()
        .oneshot(upload_request(
            "PUT",
            &format!("/storage/documents/{}", id),
            multipart_body("file", Some("gnome.png"), b"portable network"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/storage/documents/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response).await, b"portable network");

    let mut files: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    files.sort();
    assert_eq!(files, vec![format!("{}.png", id)]);
}

#[tokio::test]
async fn test_delete_then_not_found() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 1024 * 1024);
    let id = upload(&app, "a.txt", b"abc").await;
    let uri = format!("/storage/documents/{}", id);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(empty_request("GET", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_without_filename_is_unnamed() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 1024 * 1024);

    let response = app
        .clone()
        .oneshot(upload_request(
            "POST",
            "/storage/documents",
            multipart_body("file", None, b"anonymous"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = String::from_utf8(body_bytes(response).await).unwrap();

    let response = app
        .oneshot(empty_request("GET", &format!("/storage/documents/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"unnamed.\""
    );
}

#[tokio::test]
async fn test_download_ignores_recorded_size() {
    let temp = TempDir::new().unwrap();
    let (app, metadata) = test_app_with_metadata(&temp, 1024 * 1024);
    let id = upload(&app, "a.txt", b"abcd").await;

    // Record claims far more bytes than the file holds
    let mut record = metadata.find_by_id(&id).unwrap().unwrap();
    record.size_bytes = 1 << 46;
    metadata.save(&record).unwrap();

    let response = app
        .oneshot(empty_request("GET", &format!("/storage/documents/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"abcd");
}

// =============================================================================
// Error Statuses
// =============================================================================

#[tokio::test]
async fn test_unknown_id_is_404_with_json_error() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 1024 * 1024);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/storage/documents/testid12320character"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "No document found with that ID");
    assert_eq!(body["code"], 404);

    let response = app
        .oneshot(upload_request(
            "PUT",
            "/storage/documents/testid12320character",
            multipart_body("file", Some("a.txt"), b"x"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_id_is_404() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("secret.txt"), b"private").unwrap();
    let app = test_app(&temp, 1024 * 1024);

    let response = app
        .oneshot(empty_request("GET", "/storage/documents/..%2Fsecret.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(temp.path().join("secret.txt").exists());
}

#[tokio::test]
async fn test_missing_file_field_is_400() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 1024 * 1024);

    let response = app
        .oneshot(upload_request(
            "POST",
            "/storage/documents",
            multipart_body("attachment", Some("a.txt"), b"abc"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 64);

    let response = app
        .oneshot(upload_request(
            "POST",
            "/storage/documents",
            multipart_body("file", Some("big.bin"), &[7u8; 4096]),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let app = test_app(&temp, 1024);

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
