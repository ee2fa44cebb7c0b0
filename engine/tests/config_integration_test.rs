//! Integration tests for configuration management
//!
//! These tests verify that `deploykit.toml` is found in a project directory,
//! parsed, validated, and turned into writer and uploader settings.

use deploykit_engine::config::{Config, CONFIG_FILE_NAME};
use sdk::errors::DeployError;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_full_config_loaded_from_project() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(CONFIG_FILE_NAME),
        r#"
[core]
log_level = "debug"

[build]
root_stack_file_name = "cloudformation-template.json"

[transform]
command = "graphql-transform"
args = ["--format", "bundle"]

[upload]
endpoint = "https://deployments.example.com/api"
key_prefix = "dev"
max_attempts = 7
initial_backoff_ms = 500
"#,
    )
    .unwrap();

    let config = Config::load_for_project(temp.path()).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(
        config.write_options().root_stack_file_name,
        "cloudformation-template.json"
    );
    assert_eq!(config.transform.command.as_deref(), Some("graphql-transform"));
    assert_eq!(config.transform.args, vec!["--format", "bundle"]);
    assert_eq!(
        config.upload.endpoint.as_deref(),
        Some("https://deployments.example.com/api")
    );

    let policy = config.retry_policy();
    assert_eq!(policy.max_attempts, 7);
    assert_eq!(policy.initial_backoff, Duration::from_millis(500));
    assert_eq!(policy.key_prefix, "dev");
}

#[test]
fn test_partial_config_fills_defaults() {
    let config = Config::from_toml("[upload]\nendpoint = \"http://localhost:9000\"\n").unwrap();

    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.build.root_stack_file_name, "rootStack.json");
    assert_eq!(config.upload.max_attempts, 5);
    assert_eq!(config.upload.initial_backoff_ms, 1000);
}

#[test]
fn test_unparseable_config_names_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[build\nroot_stack_file_name = ").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(matches!(&err, DeployError::Config(_)));
    assert!(err.to_string().contains(CONFIG_FILE_NAME));
}

#[test]
fn test_root_stack_name_must_be_plain_file_name() {
    for bad in ["", "   ", "nested/root.json"] {
        let toml = format!("[build]\nroot_stack_file_name = \"{}\"\n", bad);
        assert!(matches!(Config::from_toml(&toml), Err(DeployError::Config(_))));
    }
}

#[test]
fn test_empty_transform_command_rejected() {
    let result = Config::from_toml("[transform]\ncommand = \"\"\n");
    assert!(matches!(result, Err(DeployError::Config(_))));
}
