//! Deployment bundle types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::template::InfrastructureTemplate;

/// A stack template together with the text it was read from, if any
///
/// Serializes exactly like the bare template; `raw` never leaves the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackDocument {
    pub template: InfrastructureTemplate,

    /// Exact on-disk text for user supplied stacks
    #[serde(skip)]
    pub raw: Option<String>,
}

impl StackDocument {
    /// A stack produced in memory, serialized on write
    pub fn generated(template: InfrastructureTemplate) -> Self {
        Self {
            template,
            raw: None,
        }
    }

    /// Parse user supplied text, keeping the text for verbatim output
    pub fn from_raw(raw: impl Into<String>) -> Result<Self, serde_json::Error> {
        let raw = raw.into();
        let template = InfrastructureTemplate::from_json(&raw)?;
        Ok(Self {
            template,
            raw: Some(raw),
        })
    }
}

/// The merged, write-ready collection of deployment artifacts
///
/// This is also the wire shape produced by the schema transformer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentBundle {
    #[serde(default)]
    pub schema: String,

    /// Resolver documents keyed by file name
    #[serde(default)]
    pub resolvers: BTreeMap<String, String>,

    /// Nested stacks keyed by stack (file) name
    #[serde(default)]
    pub stacks: BTreeMap<String, StackDocument>,

    #[serde(default)]
    pub root_stack: InfrastructureTemplate,

    /// Packaged function artifacts keyed by file name
    #[serde(default)]
    pub functions: BTreeMap<String, PathBuf>,
}

impl DeploymentBundle {
    /// Parse a bundle emitted by a transformer
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// User-authored overrides read from a project directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserConfigurationBundle {
    pub schema: Option<String>,
    pub resolvers: BTreeMap<String, String>,
    pub stacks: BTreeMap<String, StackDocument>,
}

/// A single file queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// Relative, `/`-separated object key
    pub key: String,
    pub body: Vec<u8>,
}

/// Receipt for an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedObject {
    pub key: String,
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_parses_transformer_output() {
        let json = r#"{
            "schema": "type Query { ping: String }",
            "resolvers": { "Query.ping.req.vtl": "{}" },
            "stacks": { "Ping.json": { "Resources": {} } },
            "rootStack": { "Resources": { "GraphQLAPI": { "Type": "AWS::AppSync::GraphQLApi" } } },
            "functions": { "handler.zip": "/tmp/handler.zip" }
        }"#;
        let bundle = DeploymentBundle::from_json(json).unwrap();
        assert_eq!(bundle.resolvers.len(), 1);
        assert!(bundle.stacks["Ping.json"].raw.is_none());
        assert!(bundle.root_stack.resources.contains_key("GraphQLAPI"));
        assert_eq!(bundle.functions["handler.zip"], PathBuf::from("/tmp/handler.zip"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let bundle = DeploymentBundle::from_json(r#"{ "schema": "type A { id: ID }" }"#).unwrap();
        assert!(bundle.resolvers.is_empty());
        assert!(bundle.stacks.is_empty());
        assert!(bundle.functions.is_empty());
        assert!(bundle.root_stack.resources.is_empty());
    }

    #[test]
    fn test_stack_document_keeps_raw_text() {
        let raw = "{\n  \"Resources\": {}\n}\n";
        let doc = StackDocument::from_raw(raw).unwrap();
        assert_eq!(doc.raw.as_deref(), Some(raw));
        let serialized = serde_json::to_string(&doc).unwrap();
        assert!(!serialized.contains("raw"));
    }
}
