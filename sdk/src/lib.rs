//! Deploykit SDK
//!
//! Shared data model and error taxonomy for the deployment pipeline.
//! This crate is used by the engine and by anything that produces or
//! consumes deployment bundles.

/// Error types and handling
pub mod errors;

/// Infrastructure template model
pub mod template;

/// Deployment bundle types
pub mod types;

// Re-export commonly used types
pub use errors::{DeployError, DeployErrorExt, ErrorCategory, TransportError};
pub use template::{InfrastructureTemplate, Resource};
pub use types::{
    DeploymentBundle, StackDocument, UploadTask, UploadedObject, UserConfigurationBundle,
};
