//! docstore - a single-node document blob store
//!
//! Clients upload a file, receive an opaque id, and later retrieve, overwrite
//! or delete the content by that id.

pub mod cli;
pub mod document_store;
pub mod http_server;
