//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::document_store::DocumentError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, directories)
    IoError,
    /// Engine or server failed to start
    BootFailed,
    /// Storage operation failed
    StorageError,
    /// Verification found inconsistent documents
    Inconsistent,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DOCSTORE_CLI_CONFIG_ERROR",
            Self::IoError => "DOCSTORE_CLI_IO_ERROR",
            Self::BootFailed => "DOCSTORE_CLI_BOOT_FAILED",
            Self::StorageError => "DOCSTORE_CLI_STORAGE_ERROR",
            Self::Inconsistent => "DOCSTORE_CLI_INCONSISTENT",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Boot failed
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    /// Verification found `count` inconsistent documents
    pub fn inconsistent(count: usize) -> Self {
        Self::new(
            CliErrorCode::Inconsistent,
            format!("{} inconsistent document(s) found", count),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<DocumentError> for CliError {
    fn from(e: DocumentError) -> Self {
        Self::new(CliErrorCode::StorageError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
