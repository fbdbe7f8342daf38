//! # HTTP Server Module
//!
//! Axum front end for the document store.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `POST /storage/documents` - Upload a document (multipart field `file`)
//! - `GET /storage/documents/:doc_id` - Download
//! - `PUT /storage/documents/:doc_id` - Overwrite (multipart field `file`)
//! - `DELETE /storage/documents/:doc_id` - Delete

pub mod config;
pub mod document_routes;
pub mod health_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use document_routes::DocumentState;
pub use server::HttpServer;
