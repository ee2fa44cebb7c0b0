//! Configuration management
//!
//! This module handles loading and validation of the project configuration.
//! Configuration is stored in TOML format at `<project>/deploykit.toml` and
//! every section is optional; a project without the file builds with defaults.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **build**: Output naming
//! - **transform**: External schema transformer command
//! - **upload**: Object storage endpoint and retry budget
//!
//! # Examples
//!
//! ```no_run
//! use deploykit_engine::config::Config;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_for_project(Path::new("./my-api"))?;
//! println!("Root stack file: {}", config.build.root_stack_file_name);
//! # Ok(())
//! # }
//! ```

use sdk::errors::DeployError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::uploader::RetryPolicy;
use crate::writer::WriteOptions;

/// File name looked up in the project directory
pub const CONFIG_FILE_NAME: &str = "deploykit.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Build output settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Schema transformer settings
    #[serde(default)]
    pub transform: TransformConfig,

    /// Upload settings
    #[serde(default)]
    pub upload: UploadConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Build output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// File name of the root stack inside the build directory
    #[serde(default = "default_root_stack_file_name")]
    pub root_stack_file_name: String,
}

/// External transformer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Program that reads a schema on stdin and prints a deployment bundle.
    /// A relative path is resolved from the project directory.
    #[serde(default)]
    pub command: Option<String>,

    /// Extra arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Base URL objects are PUT under
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Prefix prepended to every object key
    #[serde(default)]
    pub key_prefix: String,

    /// Attempts per file, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled after each failure
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root_stack_file_name: default_root_stack_file_name(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            key_prefix: String::new(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_root_stack_file_name() -> String {
    crate::writer::DEFAULT_ROOT_STACK_FILE_NAME.to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

impl Config {
    /// Load `deploykit.toml` from a project directory, falling back to defaults
    /// when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Config` if the file exists but cannot be read,
    /// parsed, or validated.
    pub fn load_for_project(project_dir: &Path) -> Result<Self, DeployError> {
        let path = Self::project_config_path(project_dir);
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE_NAME, project_dir);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, DeployError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            DeployError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config = Self::from_toml(&contents)
            .map_err(|e| DeployError::Config(format!("{:?}: {}", path, e)))?;

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self, DeployError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| DeployError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Path of the configuration file for a project
    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE_NAME)
    }

    /// Options handed to the deployment writer
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            root_stack_file_name: self.build.root_stack_file_name.clone(),
        }
    }

    /// Retry policy handed to the directory uploader
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.upload.max_attempts,
            initial_backoff: Duration::from_millis(self.upload.initial_backoff_ms),
            key_prefix: self.upload.key_prefix.clone(),
        }
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, DeployError> {
        toml::to_string_pretty(self)
            .map_err(|e| DeployError::Config(format!("Failed to serialize config: {}", e)))
    }

    fn validate(&self) -> Result<(), DeployError> {
        // Validate log level
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(DeployError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let root_name = self.build.root_stack_file_name.trim();
        if root_name.is_empty() || root_name.contains('/') || root_name.contains('\\') {
            return Err(DeployError::Config(format!(
                "Invalid root_stack_file_name '{}'. Must be a plain file name",
                self.build.root_stack_file_name
            )));
        }

        if self.upload.max_attempts == 0 {
            return Err(DeployError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if let Some(command) = &self.transform.command {
            if command.trim().is_empty() {
                return Err(DeployError::Config(
                    "transform.command must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
