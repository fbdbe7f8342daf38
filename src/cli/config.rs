//! Configuration file loading and validation
//!
//! The file is a single JSON object:
//!
//! ```json
//! {
//!   "storage_dir": "./data/documents",
//!   "metadata_file": "./data/metadata.json",
//!   "max_id_attempts": 4096,
//!   "max_upload_bytes": 104857600,
//!   "http": { "host": "0.0.0.0", "port": 8080, "cors_origins": [] }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document_store::id::DEFAULT_MAX_ID_ATTEMPTS;
use crate::document_store::EngineConfig;
use crate::http_server::HttpServerConfig;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding document content (required)
    pub storage_dir: String,

    /// JSON metadata file; in-memory metadata when absent
    #[serde(default)]
    pub metadata_file: Option<String>,

    /// Id collision retries (default 4096)
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: usize,

    /// Largest accepted upload body (default 100MB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_max_id_attempts() -> usize {
    DEFAULT_MAX_ID_ATTEMPTS
}
fn default_max_upload_bytes() -> usize {
    104857600
} // 100MB

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.storage_dir.trim().is_empty() {
            return Err(CliError::config_error("storage_dir must not be empty"));
        }

        if let Some(metadata_file) = &self.metadata_file {
            if metadata_file.trim().is_empty() {
                return Err(CliError::config_error("metadata_file must not be empty"));
            }
        }

        if self.max_id_attempts == 0 {
            return Err(CliError::config_error("max_id_attempts must be > 0"));
        }

        if self.max_upload_bytes == 0 {
            return Err(CliError::config_error("max_upload_bytes must be > 0"));
        }

        Ok(())
    }

    /// Storage directory as Path
    pub fn storage_path(&self) -> &Path {
        Path::new(&self.storage_dir)
    }

    /// Metadata file as Path, if configured
    pub fn metadata_path(&self) -> Option<&Path> {
        self.metadata_file.as_deref().map(Path::new)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_id_attempts: self.max_id_attempts,
        }
    }
}
