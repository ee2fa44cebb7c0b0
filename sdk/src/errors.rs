//! Error types and handling
//!
//! This module provides the error types used throughout the deployment pipeline.
//! All errors implement the `DeployErrorExt` trait which provides user-friendly
//! hints, indicates whether errors are recoverable, and groups variants into
//! the broad categories callers branch on.
//!
//! Every variant that concerns a project input carries the offending file,
//! path or stack name so the message alone is enough to locate the problem.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Trait for deployment error extensions
///
/// Provides additional context for errors: a user-facing hint, whether a
/// retry could succeed, and the category of failure.
pub trait DeployErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Only transport failures are retried by the uploader. Everything else
    /// needs the project inputs or the environment fixed first.
    fn is_recoverable(&self) -> bool;

    /// Returns the category this error belongs to
    fn category(&self) -> ErrorCategory;
}

/// Broad classification of pipeline failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or invalid project inputs
    Configuration,
    /// A user stack collides with a generated stack
    DuplicateStackName,
    /// Upload preconditions unmet
    InvalidArgument,
    /// Raised by an upload transport
    Transport,
    /// Local disk failure
    Filesystem,
    /// The external transformation engine failed
    Transform,
    /// A template could not be serialized
    Serialization,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::DuplicateStackName => "duplicate-stack-name",
            Self::InvalidArgument => "invalid-argument",
            Self::Transport => "transport",
            Self::Filesystem => "filesystem",
            Self::Transform => "transform",
            Self::Serialization => "serialization",
        };
        f.write_str(name)
    }
}

/// Failure raised by an upload transport
///
/// The uploader hands this back to its caller unchanged once the retry
/// budget is spent, so the message stays exactly what the transport produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Request for {key} failed: {message}")]
    Request { key: String, message: String },

    #[error("Upload of {key} rejected with HTTP {status}")]
    Status { key: String, status: u16 },

    #[error("{0}")]
    Other(String),
}

/// Main pipeline error type
///
/// # Error Categories
///
/// - **Configuration**: schema absent, bad stack extension, malformed template,
///   invalid `deploykit.toml`
/// - **DuplicateStackName**: user stack name equals a generated one
/// - **InvalidArgument**: upload preconditions unmet
/// - **Transport**: upload failure, retried with backoff
/// - **Filesystem**: surfaced verbatim with the path, never retried
///
/// # Examples
///
/// ```
/// use sdk::errors::{DeployError, DeployErrorExt, ErrorCategory};
///
/// let error = DeployError::UnsupportedFormat("stacks/custom.yaml".to_string());
/// assert_eq!(error.category(), ErrorCategory::Configuration);
/// assert!(error.to_string().contains("custom.yaml"));
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum DeployError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No schema.graphql file or schema directory found in {0:?}")]
    SchemaNotFound(PathBuf),

    #[error("Unsupported stack format for {0}: yaml stacks are not supported, use json")]
    UnsupportedFormat(String),

    #[error("Invalid stack file extension for {0}: expected .json")]
    InvalidExtension(String),

    #[error("Malformed template in {file}: {reason}")]
    MalformedTemplate { file: String, reason: String },

    // Merge errors
    #[error("User defined stack {0} conflicts with a generated stack")]
    DuplicateStackName(String),

    // Upload errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    // Local disk errors
    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Transformation engine errors
    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DeployError {
    /// Wrap an I/O error with the path it occurred at
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl DeployErrorExt for DeployError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your deploykit.toml file for errors",
            Self::SchemaNotFound(_) => "Add a schema.graphql file or a schema/ directory",
            Self::UnsupportedFormat(_) => "Convert the stack template to JSON",
            Self::InvalidExtension(_) => "Stack files must use the .json extension",
            Self::MalformedTemplate { .. } => "Fix the JSON syntax of the stack template",
            Self::DuplicateStackName(_) => "Rename the custom stack so it does not shadow a generated one",
            Self::InvalidArgument(_) => "Check the upload directory and retry settings",
            Self::Transport(_) => "Upload failed. Check your network and storage endpoint",
            Self::Filesystem { .. } => "File system operation failed",
            Self::Transform(_) => "The schema transformer failed. Check its output",
            Self::Serialization(_) => "A template could not be serialized",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_)
            | Self::SchemaNotFound(_)
            | Self::UnsupportedFormat(_)
            | Self::InvalidExtension(_)
            | Self::MalformedTemplate { .. } => ErrorCategory::Configuration,
            Self::DuplicateStackName(_) => ErrorCategory::DuplicateStackName,
            Self::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Filesystem { .. } => ErrorCategory::Filesystem,
            Self::Transform(_) => ErrorCategory::Transform,
            Self::Serialization(_) => ErrorCategory::Serialization,
        }
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
