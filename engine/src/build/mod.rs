//! Build orchestration
//!
//! Sequences one build: load the project, run the transformer on its schema,
//! merge, and write the result to `<project>/build`. Nothing is retried here;
//! the first failure is returned as-is.
//!
//! Builds against the same project directory must not run concurrently.
//! No locking is done.

use sdk::errors::DeployError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::loader::load_project;
use crate::merger::merge;
use crate::transform::Transformer;
use crate::writer::{write_deployment, WriteOptions};

/// Subdirectory of the project a build is written to
pub const BUILD_DIR_NAME: &str = "build";

/// Summary of a finished build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub build_dir: PathBuf,
    pub resolvers: usize,
    pub stacks: Vec<String>,
    pub functions: usize,
}

/// Build a project into `<project>/build`.
pub async fn build_project(
    project_dir: &Path,
    transformer: &dyn Transformer,
    options: &WriteOptions,
) -> Result<BuildReport, DeployError> {
    let user = load_project(project_dir).await?;

    let schema = user.schema.clone().unwrap_or_default();
    let generated = transformer.transform(&schema).await?;
    let merged = merge(&user, generated)?;

    let build_dir = project_dir.join(BUILD_DIR_NAME);
    write_deployment(&merged, &build_dir, options).await?;

    info!("Build written to {}", build_dir.display());
    Ok(BuildReport {
        build_dir,
        resolvers: merged.resolvers.len(),
        stacks: merged.stacks.keys().cloned().collect(),
        functions: merged.functions.len(),
    })
}
