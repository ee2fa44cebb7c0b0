//! External command transformer
//!
//! Runs a configured program, writes the schema to its stdin and parses the
//! deployment bundle it prints as JSON on stdout.

use async_trait::async_trait;
use sdk::errors::DeployError;
use sdk::types::DeploymentBundle;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::Transformer;

#[derive(Debug, Clone)]
pub struct CommandTransformer {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl CommandTransformer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Run the program from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl Transformer for CommandTransformer {
    async fn transform(&self, schema: &str) -> Result<DeploymentBundle, DeployError> {
        info!("Running transformer {}", self.program);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            DeployError::Transform(format!("Failed to start {}: {}", self.program, e))
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(schema.as_bytes()).await {
                Ok(()) => {}
                // The program quit without reading; its exit status tells why
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => {
                    return Err(DeployError::Transform(format!(
                        "Failed to write schema to {}: {}",
                        self.program, e
                    )));
                }
            }
            // Dropping stdin closes the pipe so the program sees EOF
        }

        let output = child.wait_with_output().await.map_err(|e| {
            DeployError::Transform(format!("Failed to wait for {}: {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::Transform(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        debug!("Transformer produced {} bytes", output.stdout.len());
        let stdout = String::from_utf8_lossy(&output.stdout);
        DeploymentBundle::from_json(&stdout).map_err(|e| {
            DeployError::Transform(format!("Invalid bundle from {}: {}", self.program, e))
        })
    }
}
