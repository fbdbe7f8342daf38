//! # Document Store Errors

use thiserror::Error;

/// Result type for document store operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// No record for the id, or the record's backing file is gone.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Byte sink was asked to delete a path that does not exist.
    #[error("File missing: {0}")]
    FileMissing(String),

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Metadata store error: {0}")]
    Metadata(String),

    #[error("No free document id after {0} attempts")]
    ExhaustedIdSpace(usize),
}

impl DocumentError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            DocumentError::NotFound(_) => 404,
            DocumentError::FileMissing(_) => 404,
            DocumentError::InvalidFileName(_) => 400,
            DocumentError::InvalidPath(_) => 400,
            DocumentError::Io(_) => 500,
            DocumentError::Metadata(_) => 500,
            DocumentError::ExhaustedIdSpace(_) => 500,
        }
    }

    /// Message safe to hand to a remote caller. Never contains paths.
    pub fn public_message(&self) -> &'static str {
        match self {
            DocumentError::NotFound(_) | DocumentError::FileMissing(_) => {
                "No document found with that ID"
            }
            DocumentError::InvalidFileName(_) => "Invalid file name",
            DocumentError::InvalidPath(_) => "Invalid document path",
            _ => "Internal storage error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::NotFound(_))
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(e: std::io::Error) -> Self {
        DocumentError::Io(e.to_string())
    }
}
