//! CLI interface for deploykit
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Deploykit
///
/// Merges generated API infrastructure with project overrides, writes the
/// deployment to disk and uploads it to object storage.
#[derive(Parser, Debug)]
#[command(name = "deploykit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project directory
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Transform the schema, merge overrides and write <project>/build
    Build {
        /// Transformer program, overriding transform.command. Relative paths
        /// are taken from the current directory; the program runs in the project
        #[arg(long, value_name = "PROGRAM")]
        transformer: Option<String>,
    },

    /// Upload a directory tree to object storage
    Upload {
        /// Directory to upload (default: <project>/build)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Base URL objects are PUT under, overriding upload.endpoint
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
}
