//! CLI command implementations
//!
//! Each command loads the configuration file, builds what it needs from it,
//! and reports its outcome as JSON on stdout. Logs go to stderr.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::document_store::{
    ByteSink, InMemoryMetadataStore, JsonFileMetadataStore, LocalByteSink, MetadataStore,
    StorageEngine,
};
use crate::http_server::{DocumentState, HttpServer};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{write_line, write_response};

const DEFAULT_LOG_FILTER: &str = "docstore=info,tower_http=info";

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Verify { config } => verify(&config),
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second install (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Build the storage engine described by `config`.
pub fn build_engine(config: &Config) -> CliResult<StorageEngine> {
    let metadata: Arc<dyn MetadataStore> = match config.metadata_path() {
        Some(path) => Arc::new(JsonFileMetadataStore::open(path)?),
        None => Arc::new(InMemoryMetadataStore::new()),
    };
    let sink: Arc<dyn ByteSink> = Arc::new(LocalByteSink::new(config.storage_path().to_path_buf()));

    Ok(StorageEngine::new(config.engine_config(), metadata, sink))
}

/// Create the storage directory and the metadata file's directory.
///
/// Existing directories are left alone.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;

    let mut dirs = vec![config.storage_path().to_path_buf()];
    if let Some(parent) = config.metadata_path().and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            dirs.push(parent.to_path_buf());
        }
    }

    for dir in &dirs {
        fs::create_dir_all(dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    write_response(json!({
        "initialized": true,
        "storage_dir": config.storage_dir,
    }))
}

/// Start the document HTTP API and block until it stops.
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    init_tracing();

    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let engine = build_engine(&config)?;
    info!(
        storage_dir = %config.storage_dir,
        metadata_file = config.metadata_file.as_deref().unwrap_or("<memory>"),
        "storage engine ready"
    );

    let state = DocumentState::new(Arc::new(engine), config.max_upload_bytes);
    let server = HttpServer::new(config.http.clone(), state);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print every inconsistent document, one JSON line each.
///
/// Fails when at least one was found.
pub fn verify(config_path: &Path) -> CliResult<()> {
    init_tracing();

    let config = Config::load(config_path)?;
    let engine = build_engine(&config)?;

    let report = engine.verify()?;
    for entry in &report {
        write_line(entry)?;
    }

    if report.is_empty() {
        write_response(json!({"inconsistencies": 0}))
    } else {
        Err(CliError::inconsistent(report.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(temp: &TempDir, with_metadata: bool) -> std::path::PathBuf {
        let storage = temp.path().join("docs");
        let mut config = json!({ "storage_dir": storage });
        if with_metadata {
            config["metadata_file"] = json!(temp.path().join("meta").join("documents.json"));
        }
        let path = temp.path().join("docstore.json");
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    #[test]
    fn test_init_creates_directories() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, true);

        init(&config_path).unwrap();
        assert!(temp.path().join("docs").is_dir());
        assert!(temp.path().join("meta").is_dir());

        // Running again is fine
        init(&config_path).unwrap();
    }

    #[test]
    fn test_build_engine_persists_metadata() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&write_config(&temp, true)).unwrap();

        let id = {
            let engine = build_engine(&config).unwrap();
            engine.store("report.pdf", &mut &b"%PDF-1.7"[..]).unwrap()
        };

        let engine = build_engine(&config).unwrap();
        let doc = engine.load(&id).unwrap();
        assert_eq!(doc.record.display_name, "report");
        assert_eq!(doc.record.size_bytes, 8);
    }

    #[test]
    fn test_verify_fails_on_missing_file() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, true);
        let config = Config::load(&config_path).unwrap();

        let id = build_engine(&config)
            .unwrap()
            .store("a.txt", &mut &b"abc"[..])
            .unwrap();
        verify(&config_path).unwrap();

        fs::remove_file(temp.path().join("docs").join(format!("{}.txt", id))).unwrap();
        let err = verify(&config_path).unwrap_err();
        assert_eq!(err.code_str(), "DOCSTORE_CLI_INCONSISTENT");
    }
}
