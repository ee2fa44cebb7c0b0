//! Project configuration loader
//!
//! Reads the user-authored parts of a project directory into a
//! `UserConfigurationBundle`:
//!
//! - `schema.graphql`, or every file under `schema/` concatenated
//! - `resolvers/*` keyed by file name
//! - `stacks/*.json` parsed as infrastructure templates
//!
//! Loading is a pure read. The first failure aborts the whole load.

use sdk::errors::DeployError;
use sdk::types::{StackDocument, UserConfigurationBundle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const SCHEMA_FILE_NAME: &str = "schema.graphql";
pub const SCHEMA_DIR_NAME: &str = "schema";
pub const RESOLVERS_DIR_NAME: &str = "resolvers";
pub const STACKS_DIR_NAME: &str = "stacks";

/// Load a project's schema, resolvers and stack overrides.
///
/// # Errors
///
/// - `SchemaNotFound` when neither `schema.graphql` nor `schema/` exists
/// - `UnsupportedFormat` / `InvalidExtension` for stacks not ending in `.json`
/// - `MalformedTemplate` for stacks that do not parse
/// - `Filesystem` for any read failure
pub async fn load_project(root: &Path) -> Result<UserConfigurationBundle, DeployError> {
    info!("Loading project configuration from {}", root.display());

    let schema = read_schema(root).await?;
    let resolvers = read_resolvers(&root.join(RESOLVERS_DIR_NAME)).await?;
    let stacks = read_stacks(&root.join(STACKS_DIR_NAME)).await?;

    debug!(
        "Loaded {} resolvers and {} stacks",
        resolvers.len(),
        stacks.len()
    );

    Ok(UserConfigurationBundle {
        schema: Some(schema),
        resolvers,
        stacks,
    })
}

/// Check that a stack file name carries the `.json` extension.
///
/// The comparison is case-sensitive: `Custom.JSON` is not a stack file.
pub fn validate_stack_file_name(name: &str) -> Result<(), DeployError> {
    let extension = Path::new(name).extension().and_then(|ext| ext.to_str());

    match extension {
        Some("json") => Ok(()),
        Some("yaml") | Some("yml") => Err(DeployError::UnsupportedFormat(name.to_string())),
        _ => Err(DeployError::InvalidExtension(name.to_string())),
    }
}

async fn read_schema(root: &Path) -> Result<String, DeployError> {
    let schema_file = root.join(SCHEMA_FILE_NAME);
    if is_file(&schema_file).await {
        debug!("Reading schema from {}", schema_file.display());
        return read_text(&schema_file).await;
    }

    let schema_dir = root.join(SCHEMA_DIR_NAME);
    if is_dir(&schema_dir).await {
        debug!("Concatenating schema documents under {}", schema_dir.display());
        return read_schema_dir(&schema_dir).await;
    }

    Err(DeployError::SchemaNotFound(root.to_path_buf()))
}

/// Concatenate every document under `dir`, depth-first in name order.
///
/// A subdirectory's documents appear where the subdirectory sorts among its
/// siblings.
async fn read_schema_dir(dir: &Path) -> Result<String, DeployError> {
    let mut documents = Vec::new();
    let mut pending: Vec<PathBuf> = sorted_entries(dir).await?.into_iter().rev().collect();

    while let Some(path) = pending.pop() {
        if is_dir(&path).await {
            pending.extend(sorted_entries(&path).await?.into_iter().rev());
        } else {
            documents.push(read_text(&path).await?);
        }
    }

    Ok(documents.join("\n"))
}

async fn read_resolvers(dir: &Path) -> Result<BTreeMap<String, String>, DeployError> {
    let mut resolvers = BTreeMap::new();
    if !is_dir(dir).await {
        return Ok(resolvers);
    }

    for path in sorted_entries(dir).await? {
        if !is_file(&path).await {
            continue;
        }
        let name = file_name(&path);
        debug!("Reading resolver {}", name);
        resolvers.insert(name, read_text(&path).await?);
    }

    Ok(resolvers)
}

async fn read_stacks(dir: &Path) -> Result<BTreeMap<String, StackDocument>, DeployError> {
    let mut stacks = BTreeMap::new();
    if !is_dir(dir).await {
        return Ok(stacks);
    }

    for path in sorted_entries(dir).await? {
        if !is_file(&path).await {
            continue;
        }
        let name = file_name(&path);
        validate_stack_file_name(&name)?;

        debug!("Reading stack {}", name);
        let raw = read_text(&path).await?;
        let document =
            StackDocument::from_raw(raw).map_err(|e| DeployError::MalformedTemplate {
                file: name.clone(),
                reason: e.to_string(),
            })?;
        stacks.insert(name, document);
    }

    Ok(stacks)
}

/// Directory entries sorted by file name
async fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, DeployError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| DeployError::filesystem(dir, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DeployError::filesystem(dir, e))?
    {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

async fn read_text(path: &Path) -> Result<String, DeployError> {
    fs::read_to_string(path)
        .await
        .map_err(|e| DeployError::filesystem(path, e))
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
