//! Schema transformer seam
//!
//! The transformer turns schema text into a `DeploymentBundle`. It is a black
//! box to the pipeline; the merger only inspects the `Type` of the root
//! stack's resources.

pub mod command;

pub use command::CommandTransformer;

use async_trait::async_trait;
use sdk::errors::DeployError;
use sdk::types::DeploymentBundle;
use std::future::Future;

/// Produces generated deployment artifacts from a schema
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(&self, schema: &str) -> Result<DeploymentBundle, DeployError>;
}

/// Adapts a closure into a `Transformer`
pub struct FnTransformer<F>(pub F);

#[async_trait]
impl<F, Fut> Transformer for FnTransformer<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<DeploymentBundle, DeployError>> + Send,
{
    async fn transform(&self, schema: &str) -> Result<DeploymentBundle, DeployError> {
        (self.0)(schema.to_string()).await
    }
}
