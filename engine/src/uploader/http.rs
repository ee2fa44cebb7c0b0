//! HTTP upload transport
//!
//! Stores each object with `PUT <endpoint>/<key>`, which is what presigned
//! object-storage endpoints and most static hosting buckets accept.

use async_trait::async_trait;
use reqwest::Client;
use sdk::errors::{DeployError, TransportError};
use sdk::types::UploadTask;
use std::time::Duration;

use super::UploadTransport;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL, without trailing slash
    endpoint: String,

    /// HTTP client for upload requests
    client: Client,
}

impl HttpTransport {
    /// Create a transport rooted at `endpoint`
    ///
    /// # Errors
    /// Returns `DeployError::InvalidArgument` for an empty endpoint or a
    /// client that cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, DeployError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(DeployError::InvalidArgument(
                "Upload endpoint must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                DeployError::InvalidArgument(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn upload(&self, task: UploadTask) -> Result<String, TransportError> {
        let url = self.url_for(&task.key);

        let response = self
            .client
            .put(&url)
            .body(task.body)
            .send()
            .await
            .map_err(|e| TransportError::Request {
                key: task.key.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                key: task.key,
                status: status.as_u16(),
            });
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_key() {
        let transport = HttpTransport::new("https://bucket.example.com/deploy/").unwrap();
        assert_eq!(transport.endpoint(), "https://bucket.example.com/deploy");
        assert_eq!(
            transport.url_for("stacks/Custom.json"),
            "https://bucket.example.com/deploy/stacks/Custom.json"
        );
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        assert!(matches!(
            HttpTransport::new("/"),
            Err(DeployError::InvalidArgument(_))
        ));
    }
}
