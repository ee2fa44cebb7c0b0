//! Deployment merger
//!
//! Combines user overrides with the output of the schema transformer.
//!
//! Resolvers supplied by the user replace generated resolvers of the same
//! name. Each user stack is added next to the generated stacks and linked
//! into the root stack through a synthesized nested-stack resource that
//! depends on every anchor resource, so the custom stack is only provisioned
//! once all generated infrastructure and the API object exist.

pub mod anchor;

pub use anchor::AnchorKind;

use sdk::errors::DeployError;
use sdk::template::{InfrastructureTemplate, Resource};
use sdk::types::{DeploymentBundle, UserConfigurationBundle};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Parameter through which custom stacks receive the API identifier
pub const API_ID_PARAMETER: &str = "AppSyncApiId";

/// Resource id of the API when the root stack declares none
pub const DEFAULT_API_RESOURCE_ID: &str = "GraphQLAPI";

/// Root parameters the nested template URL is built from
pub const DEPLOYMENT_BUCKET_PARAMETER: &str = "S3DeploymentBucket";
pub const DEPLOYMENT_ROOT_KEY_PARAMETER: &str = "S3DeploymentRootKey";

const TEMPLATE_URL_HOST: &str = "https://s3.amazonaws.com";

/// Merge user overrides into a transformer bundle.
///
/// The transformer bundle is consumed: it is modified in place and returned
/// as the merged bundle. Callers must not keep a copy they expect to remain
/// untouched.
///
/// # Errors
///
/// - `DuplicateStackName` when a user stack shares its name with a generated one
/// - `Config` when a stack's synthesized resource id is empty or already taken
pub fn merge(
    user: &UserConfigurationBundle,
    transform: DeploymentBundle,
) -> Result<DeploymentBundle, DeployError> {
    let mut merged = transform;

    merge_resolvers(user, &mut merged);
    merge_stacks(user, &mut merged)?;

    info!(
        "Merged {} resolvers and {} stacks",
        merged.resolvers.len(),
        merged.stacks.len()
    );
    Ok(merged)
}

fn merge_resolvers(user: &UserConfigurationBundle, merged: &mut DeploymentBundle) {
    for (name, document) in &user.resolvers {
        if merged.resolvers.contains_key(name) {
            debug!("User resolver {} overrides generated resolver", name);
        }
        merged.resolvers.insert(name.clone(), document.clone());
    }
}

fn merge_stacks(
    user: &UserConfigurationBundle,
    merged: &mut DeploymentBundle,
) -> Result<(), DeployError> {
    if let Some(name) = user
        .stacks
        .keys()
        .find(|name| merged.stacks.contains_key(name.as_str()))
    {
        return Err(DeployError::DuplicateStackName(name.clone()));
    }

    // Taken before any custom stack is linked in, so custom stacks never
    // wait on each other.
    let anchors = anchor_resource_ids(&merged.root_stack);
    let available = available_parameters(&merged.root_stack);

    for (name, document) in &user.stacks {
        let resource_id = stack_resource_id(name);
        if resource_id.is_empty() {
            return Err(DeployError::Config(format!(
                "Stack {} has no alphabetic characters to derive a resource id from",
                name
            )));
        }
        if merged.root_stack.resources.contains_key(&resource_id) {
            return Err(DeployError::Config(format!(
                "Stack {} maps to resource id {} which already exists in the root stack",
                name, resource_id
            )));
        }

        let parameters = parameters_for_stack(name, &document.template, &available);
        let resource = nested_stack_resource(name, parameters, anchors.clone());

        debug!(
            "Linking stack {} as {} after {} anchors",
            name,
            resource_id,
            anchors.len()
        );
        merged.root_stack.resources.insert(resource_id, resource);
        merged.stacks.insert(name.clone(), document.clone());
    }

    Ok(())
}

/// Ids of root resources whose type is an anchor kind, in resource order.
pub fn anchor_resource_ids(root: &InfrastructureTemplate) -> Vec<String> {
    root.resources
        .iter()
        .filter(|(_, resource)| AnchorKind::from_type_name(&resource.resource_type).is_some())
        .map(|(id, _)| id.clone())
        .collect()
}

/// Resource id for a stack: its name with every non-alphabetic character removed.
pub fn stack_resource_id(stack_name: &str) -> String {
    stack_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect()
}

/// Values a custom stack may receive: every root parameter by reference,
/// plus the API identifier.
fn available_parameters(root: &InfrastructureTemplate) -> BTreeMap<String, Value> {
    let mut available: BTreeMap<String, Value> = root
        .parameters
        .keys()
        .map(|name| (name.clone(), json!({ "Ref": name })))
        .collect();

    let api_id = root
        .resources
        .iter()
        .find(|(_, r)| AnchorKind::from_type_name(&r.resource_type) == Some(AnchorKind::GraphQlApi))
        .map(|(id, _)| id.as_str())
        .unwrap_or(DEFAULT_API_RESOURCE_ID);
    available.insert(
        API_ID_PARAMETER.to_string(),
        json!({ "Fn::GetAtt": [api_id, "ApiId"] }),
    );

    available
}

/// Restrict the available values to the parameters the stack declares.
///
/// Passing a parameter a nested template does not declare fails deployment,
/// so undeclared values are never forwarded.
fn parameters_for_stack(
    name: &str,
    template: &InfrastructureTemplate,
    available: &BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    let mut parameters = BTreeMap::new();
    for declared in template.parameters.keys() {
        match available.get(declared) {
            Some(value) => {
                parameters.insert(declared.clone(), value.clone());
            }
            None => warn!(
                "Stack {} declares parameter {} which the root stack cannot supply",
                name, declared
            ),
        }
    }
    parameters
}

fn nested_stack_resource(
    name: &str,
    parameters: BTreeMap<String, Value>,
    depends_on: Vec<String>,
) -> Resource {
    let template_url = json!({
        "Fn::Join": [
            "/",
            [
                TEMPLATE_URL_HOST,
                { "Ref": DEPLOYMENT_BUCKET_PARAMETER },
                { "Ref": DEPLOYMENT_ROOT_KEY_PARAMETER },
                "stacks",
                name
            ]
        ]
    });

    let mut resource = Resource::new(AnchorKind::NestedStack.type_name());
    resource.properties = Some(json!({
        "Parameters": parameters,
        "TemplateURL": template_url,
    }));
    resource.depends_on = depends_on;
    resource
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::StackDocument;

    fn root_stack() -> InfrastructureTemplate {
        InfrastructureTemplate::from_json(
            r#"{
                "Parameters": {
                    "AppSyncApiName": { "Type": "String" },
                    "env": { "Type": "String" },
                    "S3DeploymentBucket": { "Type": "String" },
                    "S3DeploymentRootKey": { "Type": "String" }
                },
                "Resources": {
                    "GraphQLAPI": { "Type": "AWS::AppSync::GraphQLApi" },
                    "GraphQLSchema": { "Type": "AWS::AppSync::GraphQLSchema" },
                    "Post": { "Type": "AWS::CloudFormation::Stack" },
                    "ApiKey": { "Type": "AWS::AppSync::ApiKey" }
                }
            }"#,
        )
        .unwrap()
    }

    fn transform_bundle() -> DeploymentBundle {
        let mut bundle = DeploymentBundle {
            schema: "type Post { id: ID! }".to_string(),
            root_stack: root_stack(),
            ..Default::default()
        };
        bundle.resolvers.insert("Query.getPost.req.vtl".to_string(), "generated".to_string());
        bundle.resolvers.insert("Query.listPosts.req.vtl".to_string(), "generated".to_string());
        bundle.stacks.insert(
            "Post.json".to_string(),
            StackDocument::generated(InfrastructureTemplate::default()),
        );
        bundle
    }

    fn user_stack(params: &[&str]) -> StackDocument {
        let declared: serde_json::Map<String, Value> = params
            .iter()
            .map(|p| (p.to_string(), json!({ "Type": "String" })))
            .collect();
        let raw = serde_json::to_string_pretty(&json!({
            "Parameters": declared,
            "Resources": { "Queue": { "Type": "AWS::SQS::Queue" } }
        }))
        .unwrap();
        StackDocument::from_raw(raw).unwrap()
    }

    #[test]
    fn test_user_resolvers_override_generated() {
        let mut user = UserConfigurationBundle::default();
        user.resolvers.insert("Query.getPost.req.vtl".to_string(), "custom".to_string());
        user.resolvers.insert("Mutation.ping.req.vtl".to_string(), "new".to_string());

        let merged = merge(&user, transform_bundle()).unwrap();
        assert_eq!(merged.resolvers["Query.getPost.req.vtl"], "custom");
        assert_eq!(merged.resolvers["Query.listPosts.req.vtl"], "generated");
        assert_eq!(merged.resolvers["Mutation.ping.req.vtl"], "new");
    }

    #[test]
    fn test_custom_stack_linked_after_anchors() {
        let mut user = UserConfigurationBundle::default();
        user.stacks.insert("Custom-Resources.json".to_string(), user_stack(&[]));

        let merged = merge(&user, transform_bundle()).unwrap();
        let resource = &merged.root_stack.resources["CustomResourcesjson"];
        assert_eq!(resource.resource_type, "AWS::CloudFormation::Stack");
        assert_eq!(
            resource.depends_on,
            vec!["GraphQLAPI".to_string(), "GraphQLSchema".to_string(), "Post".to_string()]
        );
        assert!(merged.root_stack.dangling_dependencies().is_empty());
    }

    #[test]
    fn test_only_declared_parameters_forwarded() {
        let mut user = UserConfigurationBundle::default();
        user.stacks.insert(
            "Custom.json".to_string(),
            user_stack(&["AppSyncApiId", "env", "NotProvided"]),
        );

        let merged = merge(&user, transform_bundle()).unwrap();
        let props = merged.root_stack.resources["Customjson"]
            .properties
            .as_ref()
            .unwrap();
        assert_eq!(
            props["Parameters"],
            json!({
                "AppSyncApiId": { "Fn::GetAtt": ["GraphQLAPI", "ApiId"] },
                "env": { "Ref": "env" }
            })
        );
        assert_eq!(props["TemplateURL"]["Fn::Join"][1][4], json!("Custom.json"));
    }

    #[test]
    fn test_user_stack_kept_verbatim() {
        let mut user = UserConfigurationBundle::default();
        let stack = user_stack(&["env"]);
        user.stacks.insert("Custom.json".to_string(), stack.clone());

        let merged = merge(&user, transform_bundle()).unwrap();
        assert_eq!(merged.stacks["Custom.json"], stack);
        assert!(merged.stacks.contains_key("Post.json"));
    }

    #[test]
    fn test_duplicate_stack_name_rejected() {
        let mut user = UserConfigurationBundle::default();
        user.stacks.insert("Post.json".to_string(), user_stack(&[]));

        let result = merge(&user, transform_bundle());
        assert!(matches!(result, Err(DeployError::DuplicateStackName(name)) if name == "Post.json"));
    }

    #[test]
    fn test_resource_id_collision_rejected() {
        let mut user = UserConfigurationBundle::default();
        user.stacks.insert("Api-Key".to_string(), user_stack(&[]));

        let result = merge(&user, transform_bundle());
        assert!(matches!(result, Err(DeployError::Config(msg)) if msg.contains("Api-Key")));
    }

    #[test]
    fn test_stack_resource_id_strips_non_alphabetic() {
        assert_eq!(stack_resource_id("my_custom-stack2.json"), "mycustomstackjson");
        assert_eq!(stack_resource_id("123.456"), "");
    }

    #[test]
    fn test_api_resource_id_taken_from_root() {
        let mut bundle = transform_bundle();
        let api = bundle.root_stack.resources.remove("GraphQLAPI").unwrap();
        bundle.root_stack.resources.insert("MyApi".to_string(), api);

        let mut user = UserConfigurationBundle::default();
        user.stacks.insert("Custom.json".to_string(), user_stack(&["AppSyncApiId"]));

        let merged = merge(&user, bundle).unwrap();
        let props = merged.root_stack.resources["Customjson"]
            .properties
            .as_ref()
            .unwrap();
        assert_eq!(
            props["Parameters"]["AppSyncApiId"],
            json!({ "Fn::GetAtt": ["MyApi", "ApiId"] })
        );
    }
}
