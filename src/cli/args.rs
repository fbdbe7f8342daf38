//! CLI argument definitions using clap
//!
//! Commands:
//! - docstore init --config <path>
//! - docstore serve --config <path>
//! - docstore verify --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docstore - a single-node document blob store
#[derive(Parser, Debug)]
#[command(name = "docstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the storage directories
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./docstore.json")]
        config: PathBuf,
    },

    /// Start the document HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./docstore.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check that every record has a matching backing file
    Verify {
        /// Path to configuration file
        #[arg(long, default_value = "./docstore.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
