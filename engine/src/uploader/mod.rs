//! Directory uploader
//!
//! Walks a local directory tree and hands every file to an `UploadTransport`,
//! using the path relative to the root as the object key. Failed uploads are
//! retried with exponential backoff; once the attempt budget is spent the
//! transport's own error is returned unchanged.
//!
//! The walk is top-down and depth-first. Files are uploaded one at a time and
//! a subdirectory is finished before the walk moves past it.

pub mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use sdk::errors::{DeployError, TransportError};
use sdk::types::{UploadTask, UploadedObject};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Destination for uploaded files
///
/// Implementations return the remote location of the stored object.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(&self, task: UploadTask) -> Result<String, TransportError>;
}

/// Adapts an async closure into an `UploadTransport`
pub struct FnTransport<F>(pub F);

#[async_trait]
impl<F, Fut> UploadTransport for FnTransport<F>
where
    F: Fn(UploadTask) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, TransportError>> + Send,
{
    async fn upload(&self, task: UploadTask) -> Result<String, TransportError> {
        (self.0)(task).await
    }
}

/// Retry budget and key layout for an upload run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per file, including the first
    pub max_attempts: u32,
    /// Delay before the first retry, doubled after each failure
    pub initial_backoff: Duration,
    /// Prepended to every object key, joined with `/`
    pub key_prefix: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(1000),
            key_prefix: String::new(),
        }
    }
}

impl RetryPolicy {
    /// Delays slept between consecutive attempts when every attempt fails
    pub fn delays(&self) -> Vec<Duration> {
        let retries = self.max_attempts.saturating_sub(1);
        (0..retries)
            .map(|n| self.initial_backoff.saturating_mul(2u32.saturating_pow(n)))
            .collect()
    }

    fn key_for(&self, relative: &str) -> String {
        let prefix = self.key_prefix.trim_matches('/');
        if prefix.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", prefix, relative)
        }
    }
}

/// Upload every file under `root`.
///
/// # Errors
///
/// - `InvalidArgument` before any upload if `root` is not an existing
///   directory or the policy allows no attempts
/// - `Transport` with the transport's last error once a file exhausts its attempts
/// - `Filesystem` if the tree cannot be read
pub async fn upload_directory(
    root: &Path,
    transport: &dyn UploadTransport,
    policy: &RetryPolicy,
) -> Result<Vec<UploadedObject>, DeployError> {
    let metadata = fs::metadata(root).await.map_err(|e| {
        DeployError::InvalidArgument(format!(
            "Upload directory {} is not accessible: {}",
            root.display(),
            e
        ))
    })?;
    if !metadata.is_dir() {
        return Err(DeployError::InvalidArgument(format!(
            "Upload path {} is not a directory",
            root.display()
        )));
    }
    if policy.max_attempts == 0 {
        return Err(DeployError::InvalidArgument(
            "Retry policy must allow at least one attempt".to_string(),
        ));
    }

    info!("Uploading {}", root.display());
    let mut uploaded = Vec::new();
    upload_tree(root, String::new(), transport, policy, &mut uploaded).await?;
    info!("Uploaded {} files from {}", uploaded.len(), root.display());
    Ok(uploaded)
}

fn upload_tree<'a>(
    dir: &'a Path,
    relative: String,
    transport: &'a dyn UploadTransport,
    policy: &'a RetryPolicy,
    uploaded: &'a mut Vec<UploadedObject>,
) -> BoxFuture<'a, Result<(), DeployError>> {
    async move {
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

        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let child = if relative.is_empty() {
                name
            } else {
                format!("{}/{}", relative, name)
            };

            let metadata = fs::metadata(&path)
                .await
                .map_err(|e| DeployError::filesystem(&path, e))?;

            if metadata.is_dir() {
                upload_tree(&path, child, transport, policy, uploaded).await?;
            } else {
                let body = fs::read(&path)
                    .await
                    .map_err(|e| DeployError::filesystem(&path, e))?;
                let task = UploadTask {
                    key: policy.key_for(&child),
                    body,
                };
                uploaded.push(upload_with_retry(transport, task, policy).await?);
            }
        }

        Ok(())
    }
    .boxed()
}

/// Upload one file, sleeping through `policy.delays()` between failed attempts.
pub async fn upload_with_retry(
    transport: &dyn UploadTransport,
    task: UploadTask,
    policy: &RetryPolicy,
) -> Result<UploadedObject, DeployError> {
    let mut delays = policy.delays().into_iter();
    let mut attempt = 1;

    loop {
        debug!("Uploading {} (attempt {})", task.key, attempt);
        let err = match transport.upload(task.clone()).await {
            Ok(location) => {
                return Ok(UploadedObject {
                    key: task.key,
                    location,
                });
            }
            Err(err) => err,
        };

        let Some(delay) = delays.next() else {
            warn!(
                "Giving up on {} after {} attempts: {}",
                task.key, attempt, err
            );
            return Err(err.into());
        };

        warn!(
            "Upload of {} failed (attempt {}), retrying in {:?}: {}",
            task.key, attempt, delay, err
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
