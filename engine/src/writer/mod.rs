//! Deployment writer
//!
//! Materializes a merged bundle as a directory tree:
//!
//! ```text
//! <dir>/schema.graphql
//! <dir>/resolvers/*
//! <dir>/stacks/*.json
//! <dir>/functions/*
//! <dir>/<root stack file>
//! ```
//!
//! Existing files under the target are deleted first so stale artifacts from
//! an earlier build never survive. A failure part way through leaves whatever
//! was already written; callers needing atomicity should write to a temporary
//! directory and rename it into place.

use sdk::errors::DeployError;
use sdk::template::to_json_indented;
use sdk::types::{DeploymentBundle, StackDocument};
use std::path::{Component, Path};
use tokio::fs;
use tracing::{debug, info};

use crate::loader::{
    validate_stack_file_name, RESOLVERS_DIR_NAME, SCHEMA_FILE_NAME, STACKS_DIR_NAME,
};

pub const DEFAULT_ROOT_STACK_FILE_NAME: &str = "rootStack.json";
pub const FUNCTIONS_DIR_NAME: &str = "functions";

/// Output naming for a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub root_stack_file_name: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            root_stack_file_name: DEFAULT_ROOT_STACK_FILE_NAME.to_string(),
        }
    }
}

/// Write a merged bundle under `dir`, replacing any previous contents.
///
/// # Errors
///
/// - `Config` for an artifact name that is not a plain file name, before
///   anything is written
/// - `Filesystem` for any disk failure, naming the path involved
/// - `UnsupportedFormat` / `InvalidExtension` for a stack name that is not json
/// - `Serialization` if a template cannot be serialized
pub async fn write_deployment(
    bundle: &DeploymentBundle,
    dir: &Path,
    options: &WriteOptions,
) -> Result<(), DeployError> {
    info!("Writing deployment to {}", dir.display());

    check_artifact_names(bundle, options)?;

    fs::create_dir_all(dir)
        .await
        .map_err(|e| DeployError::filesystem(dir, e))?;
    empty_directory(dir).await?;

    write_file(&dir.join(SCHEMA_FILE_NAME), bundle.schema.as_bytes()).await?;

    if !bundle.resolvers.is_empty() {
        let resolvers_dir = dir.join(RESOLVERS_DIR_NAME);
        ensure_dir(&resolvers_dir).await?;
        for (name, document) in &bundle.resolvers {
            write_file(&resolvers_dir.join(name), document.as_bytes()).await?;
        }
    }

    if !bundle.stacks.is_empty() {
        let stacks_dir = dir.join(STACKS_DIR_NAME);
        ensure_dir(&stacks_dir).await?;
        for (name, document) in &bundle.stacks {
            let file_name = stack_file_name(name)?;
            let text = stack_text(document)?;
            write_file(&stacks_dir.join(file_name), text.as_bytes()).await?;
        }
    }

    if !bundle.functions.is_empty() {
        let functions_dir = dir.join(FUNCTIONS_DIR_NAME);
        ensure_dir(&functions_dir).await?;
        for (name, artifact) in &bundle.functions {
            let target = functions_dir.join(name);
            debug!("Copying function {} from {}", name, artifact.display());
            fs::copy(artifact, &target)
                .await
                .map_err(|e| DeployError::filesystem(artifact, e))?;
        }
    }

    let root_text = to_json_indented(&bundle.root_stack)?;
    write_file(&dir.join(&options.root_stack_file_name), root_text.as_bytes()).await?;

    info!(
        "Wrote {} resolvers, {} stacks and {} functions",
        bundle.resolvers.len(),
        bundle.stacks.len(),
        bundle.functions.len()
    );
    Ok(())
}

/// File name for a stack, defaulting the extension to `.json`.
pub fn stack_file_name(name: &str) -> Result<String, DeployError> {
    let file_name = if Path::new(name).extension().is_none() {
        format!("{}.json", name)
    } else {
        name.to_string()
    };
    validate_stack_file_name(&file_name)?;
    Ok(file_name)
}

/// Reject names that would not land directly inside their output directory.
///
/// Runs before anything on disk is touched.
fn check_artifact_names(
    bundle: &DeploymentBundle,
    options: &WriteOptions,
) -> Result<(), DeployError> {
    let names = bundle
        .resolvers
        .keys()
        .map(|name| ("resolver", name))
        .chain(bundle.stacks.keys().map(|name| ("stack", name)))
        .chain(bundle.functions.keys().map(|name| ("function", name)))
        .chain(std::iter::once(("root stack", &options.root_stack_file_name)));

    for (kind, name) in names {
        if !is_plain_file_name(name) {
            return Err(DeployError::Config(format!(
                "Invalid {} name '{}': must be a plain file name",
                kind, name
            )));
        }
    }
    Ok(())
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn stack_text(document: &StackDocument) -> Result<String, DeployError> {
    match &document.raw {
        Some(raw) => Ok(raw.clone()),
        None => Ok(to_json_indented(&document.template)?),
    }
}

/// Delete every file below `dir`, keeping the directories themselves.
async fn empty_directory(dir: &Path) -> Result<(), DeployError> {
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current)
            .await
            .map_err(|e| DeployError::filesystem(&current, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DeployError::filesystem(&current, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| DeployError::filesystem(&path, e))?;

            if file_type.is_dir() {
                pending.push(path);
            } else {
                debug!("Removing stale {}", path.display());
                fs::remove_file(&path)
                    .await
                    .map_err(|e| DeployError::filesystem(&path, e))?;
            }
        }
    }

    Ok(())
}

async fn ensure_dir(dir: &Path) -> Result<(), DeployError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| DeployError::filesystem(dir, e))
}

async fn write_file(path: &Path, contents: &[u8]) -> Result<(), DeployError> {
    debug!("Writing {} bytes to {}", contents.len(), path.display());
    fs::write(path, contents)
        .await
        .map_err(|e| DeployError::filesystem(path, e))
}
