//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - build: Transform, merge and write the project
//! - upload: Upload a directory tree with retries
//! - config show: Print the effective configuration

use anyhow::{Context, Result};
use sdk::errors::DeployErrorExt;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::build::{build_project, BUILD_DIR_NAME};
use crate::config::Config;
use crate::transform::CommandTransformer;
use crate::uploader::{upload_directory, HttpTransport};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Build the project into `<project>/build`
pub async fn handle_build(
    project: &Path,
    transformer: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    // --transformer is relative to where the user is; transform.command is
    // relative to the project, where the program runs
    let program = match transformer {
        Some(program) => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            resolve_program(&program, &cwd)
        }
        None => config
            .transform
            .command
            .clone()
            .context("No transformer configured. Set transform.command or pass --transformer")?,
    };

    let transformer =
        CommandTransformer::new(program, config.transform.args.clone()).with_working_dir(project);

    match build_project(project, &transformer, &config.write_options()).await {
        Ok(report) => {
            match format {
                OutputFormat::Text => {
                    println!("Build written to {}", report.build_dir.display());
                    println!("  Resolvers: {}", report.resolvers);
                    println!("  Stacks:    {}", report.stacks.len());
                    println!("  Functions: {}", report.functions);
                }
                OutputFormat::Json => {
                    let output = json!({
                        "status": "completed",
                        "report": report,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Ok(())
        }
        Err(e) => {
            report_failure(&e, format)?;
            Err(e).context("Build failed")
        }
    }
}

/// Upload a directory tree (default `<project>/build`)
pub async fn handle_upload(
    project: &Path,
    dir: Option<PathBuf>,
    endpoint: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| project.join(BUILD_DIR_NAME));
    let endpoint = endpoint
        .or_else(|| config.upload.endpoint.clone())
        .context("No upload endpoint configured. Set upload.endpoint or pass --endpoint")?;

    let transport = HttpTransport::new(endpoint)?;
    let policy = config.retry_policy();

    match upload_directory(&dir, &transport, &policy).await {
        Ok(uploaded) => {
            match format {
                OutputFormat::Text => {
                    for object in &uploaded {
                        println!("{} -> {}", object.key, object.location);
                    }
                    println!("Uploaded {} files from {}", uploaded.len(), dir.display());
                }
                OutputFormat::Json => {
                    let output = json!({
                        "status": "completed",
                        "uploaded": uploaded,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
            }
            Ok(())
        }
        Err(e) => {
            report_failure(&e, format)?;
            Err(e).with_context(|| format!("Upload of {} failed", dir.display()))
        }
    }
}

/// Print the effective configuration as TOML (or JSON)
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Load the configuration for a project, honoring `--config`
pub fn load_config(project: &Path, explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::load_from_path(path),
        None => Config::load_for_project(project),
    };
    config.context("Failed to load configuration")
}

/// Anchor a relative program path to `base`.
///
/// Bare names like `graphql-transform` are left for `PATH` lookup.
pub fn resolve_program(program: &str, base: &Path) -> String {
    let path = Path::new(program);
    let has_separator = path.components().count() > 1;
    if has_separator && path.is_relative() {
        base.join(path).to_string_lossy().into_owned()
    } else {
        program.to_string()
    }
}

fn report_failure(error: &sdk::DeployError, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => eprintln!("Hint: {}", error.user_hint()),
        OutputFormat::Json => {
            let output = json!({
                "status": "failed",
                "category": error.category().to_string(),
                "error": error.to_string(),
                "hint": error.user_hint(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
