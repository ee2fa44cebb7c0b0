//! Example demonstrating a full build followed by an upload
//!
//! This example shows how to:
//! - Lay out a project with a schema, a resolver override and a custom stack
//! - Build it with an in-process transformer
//! - Upload the build directory through a closure transport
//!
//! No network access or external transformer is needed.

use deploykit_engine::{
    build::build_project,
    transform::FnTransformer,
    uploader::{upload_directory, FnTransport, RetryPolicy},
    writer::WriteOptions,
};
use sdk::errors::{DeployError, TransportError};
use sdk::types::{DeploymentBundle, UploadTask};
use tempfile::TempDir;

const GENERATED: &str = r#"{
    "resolvers": { "Query.getNote.req.vtl": "{}" },
    "stacks": { "Note.json": { "Resources": {} } },
    "rootStack": {
        "Parameters": { "env": { "Type": "String" } },
        "Resources": {
            "GraphQLAPI": { "Type": "AWS::AppSync::GraphQLApi" },
            "Note": { "Type": "AWS::CloudFormation::Stack" }
        }
    }
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Build and Upload Example ===\n");

    let project = TempDir::new()?;
    std::fs::write(project.path().join("schema.graphql"), "type Note @model { id: ID! }")?;
    std::fs::create_dir_all(project.path().join("stacks"))?;
    std::fs::write(
        project.path().join("stacks/Alarms.json"),
        r#"{ "Parameters": { "AppSyncApiId": { "Type": "String" } }, "Resources": {} }"#,
    )?;

    println!("✓ Project created at {}", project.path().display());

    let transformer = FnTransformer(|schema: String| async move {
        let mut bundle = DeploymentBundle::from_json(GENERATED)?;
        bundle.schema = schema;
        Ok::<_, DeployError>(bundle)
    });

    let report = build_project(project.path(), &transformer, &WriteOptions::default()).await?;
    println!("✓ Build written to {}", report.build_dir.display());
    println!("  Stacks: {}", report.stacks.join(", "));

    let transport = FnTransport(|task: UploadTask| async move {
        Ok::<_, TransportError>(format!("memory://{} ({} bytes)", task.key, task.body.len()))
    });

    let uploaded = upload_directory(&report.build_dir, &transport, &RetryPolicy::default()).await?;
    for object in uploaded {
        println!("  {} -> {}", object.key, object.location);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
