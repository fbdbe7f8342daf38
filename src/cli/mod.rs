//! CLI module for docstore
//!
//! Provides command-line interface for:
//! - init: Create the storage directories
//! - serve: Run the document HTTP API
//! - verify: Report records whose backing file is missing or wrong

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build_engine, init, run, run_command, serve, verify};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_line, write_response};
