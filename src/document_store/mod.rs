//! # Document Store
//!
//! Upload a file, get back an opaque id, later load, overwrite or delete the
//! content by that id.
//!
//! Every document is a metadata record plus one backing file named
//! `id.extension` in the storage directory. The engine is the only writer of
//! both and keeps them consistent.

pub mod backend;
pub mod engine;
pub mod errors;
pub mod id;
pub mod local;
pub mod locks;
pub mod metadata;
pub mod record;

pub use backend::{ByteSink, ContentHandle};
pub use engine::{EngineConfig, Inconsistency, InconsistencyKind, StorageEngine};
pub use errors::{DocumentError, DocumentResult};
pub use id::{sanitize_id, ID_LENGTH};
pub use local::LocalByteSink;
pub use metadata::{InMemoryMetadataStore, JsonFileMetadataStore, MetadataStore};
pub use record::{split_filename, Document, DocumentRecord};
