//! Anchor resource kinds
//!
//! A custom stack may only be provisioned once every generated resource it
//! could reference exists. The resources it waits on are the anchors.

use std::fmt;

/// Resource types a custom nested stack must depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    /// A generated nested stack
    NestedStack,
    /// The GraphQL API object
    GraphQlApi,
    /// The schema attached to the API
    GraphQlSchema,
}

impl AnchorKind {
    pub const ALL: [AnchorKind; 3] = [Self::NestedStack, Self::GraphQlApi, Self::GraphQlSchema];

    /// Template `Type` string for this kind
    pub fn type_name(self) -> &'static str {
        match self {
            Self::NestedStack => "AWS::CloudFormation::Stack",
            Self::GraphQlApi => "AWS::AppSync::GraphQLApi",
            Self::GraphQlSchema => "AWS::AppSync::GraphQLSchema",
        }
    }

    /// Classify a template `Type` string
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == type_name)
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
