//! Deploykit Engine Library
//!
//! This library provides the deployment-assembly pipeline.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Project configuration loader
pub mod loader;

/// Merge of user overrides with transformer output
pub mod merger;

/// Deployment writer
pub mod writer;

/// Directory uploader and transports
pub mod uploader;

/// Schema transformer seam
pub mod transform;

/// Build orchestration
pub mod build;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
