use deploykit_engine::merger::{anchor_resource_ids, merge, stack_resource_id, AnchorKind};
use proptest::prelude::*;
use sdk::errors::DeployError;
use sdk::template::{InfrastructureTemplate, Resource};
use sdk::types::{DeploymentBundle, StackDocument, UserConfigurationBundle};
use std::collections::BTreeSet;

const OTHER_TYPES: [&str; 3] = [
    "AWS::DynamoDB::Table",
    "AWS::AppSync::Resolver",
    "AWS::IAM::Role",
];

fn resource_type() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(AnchorKind::ALL.to_vec()).prop_map(|k| k.type_name().to_string()),
        prop::sample::select(OTHER_TYPES.to_vec()).prop_map(str::to_string),
    ]
}

/// Root stacks whose resource ids are lowercase so they never collide with
/// the capitalized ids synthesized for custom stacks.
fn root_stack() -> impl Strategy<Value = InfrastructureTemplate> {
    (
        prop::collection::btree_map("[a-z]{3,8}", resource_type(), 0..8),
        prop::collection::btree_set("[a-z]{3,6}", 0..4),
    )
        .prop_map(|(resources, params)| {
            let mut template = InfrastructureTemplate::default();
            for (id, ty) in resources {
                template.resources.insert(id, Resource::new(ty));
            }
            for name in params {
                template
                    .parameters
                    .insert(name, serde_json::json!({ "Type": "String" }));
            }
            template
        })
}

fn user_stacks() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("Custom[A-Z][a-z]{2,6}", 0..5)
}

fn transform_bundle(root: InfrastructureTemplate) -> DeploymentBundle {
    let mut bundle = DeploymentBundle {
        root_stack: root,
        ..Default::default()
    };
    bundle.stacks.insert(
        "Generated.json".to_string(),
        StackDocument::generated(InfrastructureTemplate::default()),
    );
    bundle
}

fn user_bundle(names: &BTreeSet<String>) -> UserConfigurationBundle {
    let mut user = UserConfigurationBundle::default();
    for name in names {
        let doc = StackDocument::from_raw(
            r#"{ "Parameters": { "AppSyncApiId": { "Type": "String" } }, "Resources": {} }"#,
        )
        .unwrap();
        user.stacks.insert(format!("{}.json", name), doc);
    }
    user
}

proptest! {
    #[test]
    fn test_custom_stacks_depend_on_exactly_the_anchors(
        root in root_stack(),
        names in user_stacks(),
    ) {
        let anchors = anchor_resource_ids(&root);
        let user = user_bundle(&names);

        let merged = merge(&user, transform_bundle(root)).unwrap();

        for name in user.stacks.keys() {
            let resource = &merged.root_stack.resources[&stack_resource_id(name)];
            prop_assert_eq!(&resource.resource_type, AnchorKind::NestedStack.type_name());
            prop_assert_eq!(&resource.depends_on, &anchors);
            prop_assert!(merged.stacks.contains_key(name));
        }
        prop_assert!(merged.root_stack.dangling_dependencies().is_empty());
    }

    #[test]
    fn test_merge_is_deterministic(
        root in root_stack(),
        names in user_stacks(),
    ) {
        let user = user_bundle(&names);

        let first = merge(&user, transform_bundle(root.clone())).unwrap();
        let second = merge(&user, transform_bundle(root)).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_generated_name_collision_rejected(
        root in root_stack(),
        names in user_stacks(),
    ) {
        let mut user = user_bundle(&names);
        user.stacks.insert(
            "Generated.json".to_string(),
            StackDocument::generated(InfrastructureTemplate::default()),
        );

        let result = merge(&user, transform_bundle(root));
        prop_assert!(
            matches!(result, Err(DeployError::DuplicateStackName(ref name)) if name == "Generated.json")
        );
    }
}
