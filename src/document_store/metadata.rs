//! # Metadata Storage
//!
//! Abstraction for document metadata persistence.
//! Records live either in memory only or in a JSON file on disk.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::errors::{DocumentError, DocumentResult};
use super::record::DocumentRecord;

/// Trait for metadata storage operations
pub trait MetadataStore: Send + Sync {
    /// Get a record by id
    fn find_by_id(&self, id: &str) -> DocumentResult<Option<DocumentRecord>>;

    /// Check whether a record exists for id
    fn exists_by_id(&self, id: &str) -> DocumentResult<bool>;

    /// Insert or overwrite a record by id
    fn save(&self, record: &DocumentRecord) -> DocumentResult<()>;

    /// Remove a record. Removing an absent id is not an error.
    fn delete_by_id(&self, id: &str) -> DocumentResult<()>;

    /// All records, in no particular order
    fn list(&self) -> DocumentResult<Vec<DocumentRecord>>;
}

fn poisoned() -> DocumentError {
    DocumentError::Metadata("Lock poisoned".to_string())
}

/// In-memory metadata store; contents are lost when the process exits
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<String, DocumentRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn find_by_id(&self, id: &str) -> DocumentResult<Option<DocumentRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(id).cloned())
    }

    fn exists_by_id(&self, id: &str) -> DocumentResult<bool> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.contains_key(id))
    }

    fn save(&self, record: &DocumentRecord) -> DocumentResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete_by_id(&self, id: &str) -> DocumentResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.remove(id);
        Ok(())
    }

    fn list(&self) -> DocumentResult<Vec<DocumentRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.values().cloned().collect())
    }
}

/// Metadata store persisted as a single JSON document.
///
/// The whole table lives in memory; every mutation rewrites the file with
/// write-temp, fsync, rename so a crash leaves either the old or the new table.
#[derive(Debug)]
pub struct JsonFileMetadataStore {
    path: PathBuf,
    temp_path: PathBuf,
    records: RwLock<BTreeMap<String, DocumentRecord>>,
}

impl JsonFileMetadataStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: &Path) -> DocumentResult<Self> {
        let records = match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                DocumentError::Metadata(format!(
                    "failed to parse metadata file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(DocumentError::Metadata(format!(
                    "failed to read metadata file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");

        Ok(Self {
            path: path.to_path_buf(),
            temp_path: PathBuf::from(temp_name),
            records: RwLock::new(records),
        })
    }

    fn persist(&self, records: &BTreeMap<String, DocumentRecord>) -> DocumentResult<()> {
        let fail = |what: &str, e: &dyn std::fmt::Display| {
            DocumentError::Metadata(format!("failed to {} metadata file: {}", what, e))
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| fail("create directory for", &e))?;
            }
        }

        let content = serde_json::to_vec_pretty(records).map_err(|e| fail("serialize", &e))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)
            .map_err(|e| fail("create temp", &e))?;
        file.write_all(&content).map_err(|e| fail("write", &e))?;
        file.sync_all().map_err(|e| fail("fsync", &e))?;

        fs::rename(&self.temp_path, &self.path).map_err(|e| fail("commit", &e))?;

        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}

impl MetadataStore for JsonFileMetadataStore {
    fn find_by_id(&self, id: &str) -> DocumentResult<Option<DocumentRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(id).cloned())
    }

    fn exists_by_id(&self, id: &str) -> DocumentResult<bool> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.contains_key(id))
    }

    fn save(&self, record: &DocumentRecord) -> DocumentResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let previous = records.insert(record.id.clone(), record.clone());

        if let Err(e) = self.persist(&records) {
            // Keep memory in step with what is on disk
            match previous {
                Some(old) => records.insert(old.id.clone(), old),
                None => records.remove(&record.id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete_by_id(&self, id: &str) -> DocumentResult<()> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let Some(previous) = records.remove(id) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&records) {
            records.insert(previous.id.clone(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn list(&self) -> DocumentResult<Vec<DocumentRecord>> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.values().cloned().collect())
    }
}
