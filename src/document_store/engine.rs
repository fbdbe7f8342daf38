//! # Storage Engine
//!
//! Keeps each document's metadata record and its backing file in step.
//!
//! Ordering rules:
//! - the file is written before the record is saved
//! - the file is deleted before the record is deleted
//! - all mutations of one id run under that id's lock

use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use super::backend::ByteSink;
use super::errors::{DocumentError, DocumentResult};
use super::id::{random_id, sanitize_id, DEFAULT_MAX_ID_ATTEMPTS};
use super::locks::IdLocks;
use super::metadata::MetadataStore;
use super::record::{Document, DocumentRecord};

/// Engine tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Collision retries before `generate_id` gives up
    pub max_id_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
        }
    }
}

/// A record whose backing file does not match it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub id: String,
    pub stored_file_name: String,
    #[serde(flatten)]
    pub kind: InconsistencyKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InconsistencyKind {
    MissingFile,
    SizeMismatch { expected: u64, actual: u64 },
}

/// Document storage engine
pub struct StorageEngine {
    config: EngineConfig,
    metadata: Arc<dyn MetadataStore>,
    sink: Arc<dyn ByteSink>,
    locks: IdLocks,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("config", &self.config)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

impl StorageEngine {
    pub fn new(
        config: EngineConfig,
        metadata: Arc<dyn MetadataStore>,
        sink: Arc<dyn ByteSink>,
    ) -> Self {
        Self {
            config,
            metadata,
            sink,
            locks: IdLocks::new(),
        }
    }

    /// Draw a random id that no record currently uses.
    pub fn generate_id(&self) -> DocumentResult<String> {
        for attempt in 1..=self.config.max_id_attempts {
            let id = random_id();
            if !self.metadata.exists_by_id(&id)? {
                return Ok(id);
            }
            warn!(attempt, "generated document id collided, retrying");
        }

        error!(
            attempts = self.config.max_id_attempts,
            "no free document id found"
        );
        Err(DocumentError::ExhaustedIdSpace(self.config.max_id_attempts))
    }

    /// Load a document's record and open its content.
    pub fn load(&self, raw_id: &str) -> DocumentResult<Document> {
        let id = sanitize_id(raw_id);

        self.locks.with_lock(&id, || {
            let record = self.find(&id)?;
            let path = record.stored_file_name();

            match self.sink.open_readable(&path)? {
                Some(content) => Ok(Document { record, content }),
                None => {
                    warn!(doc_id = %id, "record has no readable backing file");
                    Err(DocumentError::NotFound(id.clone()))
                }
            }
        })
    }

    /// Store a new document and return its id.
    pub fn store(&self, original_filename: &str, content: &mut dyn Read) -> DocumentResult<String> {
        let id = self.generate_id()?;
        let mut record = DocumentRecord::from_upload(id.clone(), original_filename)?;

        self.locks.with_lock(&id, || {
            let path = record.stored_file_name();

            record.size_bytes = self.sink.write_all(&path, content).map_err(|e| {
                error!(doc_id = %id, error = %e, "failed to write document content");
                e
            })?;

            if let Err(e) = self.metadata.save(&record) {
                error!(doc_id = %id, error = %e, "failed to save document record");
                self.discard_file(&id, &path);
                return Err(e);
            }

            info!(
                doc_id = %id,
                size_bytes = record.size_bytes,
                extension = %record.extension,
                "document stored"
            );
            Ok(id.clone())
        })
    }

    /// Replace an existing document's content, name and extension.
    pub fn update(
        &self,
        raw_id: &str,
        original_filename: &str,
        content: &mut dyn Read,
    ) -> DocumentResult<()> {
        let id = sanitize_id(raw_id);

        self.locks.with_lock(&id, || {
            let previous = self.find(&id)?;
            let old_path = previous.stored_file_name();
            let mut record = previous.clone();

            record.rename_from_upload(original_filename)?;
            let new_path = record.stored_file_name();

            record.size_bytes = self.sink.write_all(&new_path, content).map_err(|e| {
                error!(doc_id = %id, error = %e, "failed to write updated content");
                e
            })?;

            if let Err(e) = self.metadata.save(&record) {
                error!(doc_id = %id, error = %e, "failed to save updated record");
                // On the same path the old content has already been replaced
                if new_path != old_path {
                    self.discard_file(&id, &new_path);
                }
                return Err(e);
            }

            if new_path != old_path {
                match self.sink.delete(&old_path) {
                    Ok(()) | Err(DocumentError::FileMissing(_)) => {}
                    Err(e) => {
                        // Old file is still in place: point the record back at it
                        error!(doc_id = %id, error = %e, "failed to remove replaced content");
                        match self.metadata.save(&previous) {
                            Ok(()) => self.discard_file(&id, &new_path),
                            Err(restore) => error!(
                                doc_id = %id,
                                error = %restore,
                                "failed to restore previous record"
                            ),
                        }
                        return Err(e);
                    }
                }
            }

            info!(
                doc_id = %id,
                size_bytes = record.size_bytes,
                extension = %record.extension,
                "document updated"
            );
            Ok(())
        })
    }

    /// Delete a document's content and record.
    pub fn delete(&self, raw_id: &str) -> DocumentResult<()> {
        let id = sanitize_id(raw_id);

        self.locks.with_lock(&id, || {
            let record = self.find(&id)?;

            match self.sink.delete(&record.stored_file_name()) {
                Ok(()) => {}
                Err(DocumentError::FileMissing(_)) => {
                    warn!(doc_id = %id, "backing file already missing, removing record");
                }
                Err(e) => {
                    error!(doc_id = %id, error = %e, "failed to delete document content");
                    return Err(e);
                }
            }

            self.metadata.delete_by_id(&id).map_err(|e| {
                error!(doc_id = %id, error = %e, "failed to delete document record");
                e
            })?;

            info!(doc_id = %id, "document deleted");
            Ok(())
        })
    }

    /// Report every record whose backing file is missing or has the wrong length.
    pub fn verify(&self) -> DocumentResult<Vec<Inconsistency>> {
        let mut records = self.metadata.list()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));

        let mut found = Vec::new();
        for record in records {
            let stored_file_name = record.stored_file_name();
            let kind = match self.sink.file_len(&stored_file_name)? {
                None => InconsistencyKind::MissingFile,
                Some(actual) if actual != record.size_bytes => InconsistencyKind::SizeMismatch {
                    expected: record.size_bytes,
                    actual,
                },
                Some(_) => continue,
            };

            warn!(doc_id = %record.id, ?kind, "inconsistent document");
            found.push(Inconsistency {
                id: record.id,
                stored_file_name,
                kind,
            });
        }

        Ok(found)
    }

    fn find(&self, id: &str) -> DocumentResult<DocumentRecord> {
        if id.is_empty() {
            return Err(DocumentError::NotFound(String::new()));
        }
        self.metadata
            .find_by_id(id)?
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    fn discard_file(&self, id: &str, path: &str) {
        if let Err(e) = self.sink.delete(path) {
            warn!(doc_id = %id, error = %e, "failed to remove orphaned content");
        }
    }
}
