//! Infrastructure template model
//!
//! A template is a JSON tree with at least `Resources` and `Parameters`.
//! Only the parts the pipeline reasons about are typed; every other key is
//! kept in `extra` so a template survives a parse/serialize cycle intact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A deployable tree of resources and parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureTemplate {
    #[serde(rename = "Parameters", default)]
    pub parameters: BTreeMap<String, Value>,

    #[serde(rename = "Resources", default)]
    pub resources: BTreeMap<String, Resource>,

    /// Remaining top-level keys (Outputs, Conditions, Description, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InfrastructureTemplate {
    /// Parse a template from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize with 4-space indentation
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        to_json_indented(self)
    }

    /// `DependsOn` entries that reference no resource in this template,
    /// as `(resource id, missing dependency)` pairs.
    pub fn dangling_dependencies(&self) -> Vec<(String, String)> {
        self.resources
            .iter()
            .flat_map(|(id, resource)| {
                resource
                    .depends_on
                    .iter()
                    .filter(|dep| !self.resources.contains_key(dep.as_str()))
                    .map(move |dep| (id.clone(), dep.clone()))
            })
            .collect()
    }
}

/// A single resource declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties", default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,

    #[serde(
        rename = "DependsOn",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub depends_on: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource {
    /// Create a resource of the given type with no properties
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: None,
            depends_on: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Templates allow `DependsOn` to be a single id or a list of ids
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}

/// Serialize any value as JSON indented with four spaces
pub fn to_json_indented<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_keeps_unknown_keys() {
        let json = r#"{
            "AWSTemplateFormatVersion": "2010-09-09",
            "Parameters": { "env": { "Type": "String" } },
            "Resources": {
                "Table": { "Type": "AWS::DynamoDB::Table", "DeletionPolicy": "Retain" }
            },
            "Outputs": {}
        }"#;
        let template = InfrastructureTemplate::from_json(json).unwrap();
        assert!(template.parameters.contains_key("env"));
        assert_eq!(template.resources["Table"].resource_type, "AWS::DynamoDB::Table");
        assert_eq!(template.resources["Table"].extra["DeletionPolicy"], json!("Retain"));
        assert!(template.extra.contains_key("Outputs"));
        assert!(template.extra.contains_key("AWSTemplateFormatVersion"));
    }

    #[test]
    fn test_depends_on_accepts_single_string() {
        let json = r#"{ "Resources": {
            "A": { "Type": "X" },
            "B": { "Type": "X", "DependsOn": "A" }
        } }"#;
        let template = InfrastructureTemplate::from_json(json).unwrap();
        assert_eq!(template.resources["B"].depends_on, vec!["A".to_string()]);
        assert!(template.dangling_dependencies().is_empty());
    }

    #[test]
    fn test_dangling_dependencies_reported() {
        let mut template = InfrastructureTemplate::default();
        let mut b = Resource::new("X");
        b.depends_on = vec!["Missing".to_string()];
        template.resources.insert("B".to_string(), b);
        assert_eq!(
            template.dangling_dependencies(),
            vec![("B".to_string(), "Missing".to_string())]
        );
    }

    #[test]
    fn test_pretty_output_uses_four_spaces() {
        let template = InfrastructureTemplate::from_json(r#"{"Resources": {}}"#).unwrap();
        let text = template.to_json_pretty().unwrap();
        assert!(text.contains("\n    \"Parameters\""));
        assert!(!text.contains("\n  \"Parameters\""));
    }
}
