//! Node kinds, capabilities and the fixed attribute enumerations
//!
//! Every value drawn by the generator comes from one of the tables in this module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of an entity in a policy structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A user or service identity that may escalate
    Principal,
    /// A role carrying a set of granted capabilities
    Role,
    /// A protected resource
    Resource,
    /// An attribute value attached to principals (NGAC)
    UserAttribute,
    /// An attribute value attached to resources (NGAC)
    ResourceAttribute,
    /// A capability node (NGAC)
    Permission,
    /// Terminal elevated-capability marker
    PolicyClass,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Principal => write!(f, "principal"),
            Self::Role => write!(f, "role"),
            Self::Resource => write!(f, "resource"),
            Self::UserAttribute => write!(f, "user_attribute"),
            Self::ResourceAttribute => write!(f, "resource_attribute"),
            Self::Permission => write!(f, "permission"),
            Self::PolicyClass => write!(f, "policy_class"),
        }
    }
}

/// Cloud capability that a role or permission node can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "iam:PassRole")]
    PassRole,
    #[serde(rename = "ec2:RunInstances")]
    RunInstances,
    #[serde(rename = "s3:PutObject")]
    PutObject,
    #[serde(rename = "iam:AttachRolePolicy")]
    AttachRolePolicy,
    #[serde(rename = "iam:UpdateRole")]
    UpdateRole,
    #[serde(rename = "iam:UpdateAssumeRolePolicy")]
    UpdateAssumeRolePolicy,
}

impl Capability {
    /// All capabilities, in generator draw order
    pub const ALL: [Capability; 6] = [
        Capability::PassRole,
        Capability::RunInstances,
        Capability::PutObject,
        Capability::AttachRolePolicy,
        Capability::UpdateRole,
        Capability::UpdateAssumeRolePolicy,
    ];

    /// The action string, also used as the permission node label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassRole => "iam:PassRole",
            Self::RunInstances => "ec2:RunInstances",
            Self::PutObject => "s3:PutObject",
            Self::AttachRolePolicy => "iam:AttachRolePolicy",
            Self::UpdateRole => "iam:UpdateRole",
            Self::UpdateAssumeRolePolicy => "iam:UpdateAssumeRolePolicy",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ABAC resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "EC2Instance")]
    Ec2Instance,
    #[serde(rename = "S3Bucket")]
    S3Bucket,
    #[serde(rename = "IAMRole")]
    IamRole,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Ec2Instance,
        ResourceType::S3Bucket,
        ResourceType::IamRole,
    ];

    /// Capability a role must grant to be connected to a resource of this type.
    ///
    /// S3 buckets never qualify.
    pub fn qualifying_capability(&self) -> Option<Capability> {
        match self {
            Self::Ec2Instance => Some(Capability::RunInstances),
            Self::IamRole => Some(Capability::PassRole),
            Self::S3Bucket => None,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ec2Instance => write!(f, "EC2Instance"),
            Self::S3Bucket => write!(f, "S3Bucket"),
            Self::IamRole => write!(f, "IAMRole"),
        }
    }
}

/// Policy class: a leaf marking a broad capability domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyClass {
    Iam,
    Ec2,
    S3,
    Kms,
    Rds,
}

impl PolicyClass {
    pub const ALL: [PolicyClass; 5] = [
        PolicyClass::Iam,
        PolicyClass::Ec2,
        PolicyClass::S3,
        PolicyClass::Kms,
        PolicyClass::Rds,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Iam => "IAM",
            Self::Ec2 => "EC2",
            Self::S3 => "S3",
            Self::Kms => "KMS",
            Self::Rds => "RDS",
        }
    }
}

impl std::fmt::Display for PolicyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A named attribute with its allowed values
#[derive(Debug, Clone, Copy)]
pub struct AttributeDomain {
    pub key: &'static str,
    pub values: &'static [&'static str],
}

/// ABAC principal attribute
pub const JOB_TITLE: AttributeDomain = AttributeDomain {
    key: "JobTitle",
    values: &["Developer", "DataEngineer", "SecurityAdmin"],
};

/// NGAC principal attributes
pub const USER_ATTRIBUTES: [AttributeDomain; 2] = [
    AttributeDomain {
        key: "UserType",
        values: &["Admin", "User", "Service"],
    },
    AttributeDomain {
        key: "AuthType",
        values: &["Password", "MFA", "Federated"],
    },
];

/// NGAC resource attributes
pub const RESOURCE_ATTRIBUTES: [AttributeDomain; 3] = [
    AttributeDomain {
        key: "LeastPrivilegePolicy",
        values: &["Strict", "Relaxed"],
    },
    AttributeDomain {
        key: "ResourceType",
        values: &["EC2", "S3", "KMS", "RDS"],
    },
    AttributeDomain {
        key: "IsCreateModify",
        values: &["True", "False"],
    },
];

/// One drawn attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub key: &'static str,
    pub value: &'static str,
}

impl Attribute {
    /// Label of a shared attribute node (`Key:Value`)
    pub fn shared_label(&self) -> String {
        format!("{}:{}", self.key, self.value)
    }

    /// Label of an attribute node owned by one entity (`Entity_Key:Value`)
    pub fn owned_label(&self, owner: &str) -> String {
        format!("{}_{}:{}", owner, self.key, self.value)
    }
}

/// Kind-specific payload of a node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum NodePayload {
    #[default]
    None,
    /// Capabilities granted by a role
    Grants(BTreeSet<Capability>),
    /// Type of an ABAC resource
    ResourceType(ResourceType),
}

/// A typed entity in a policy structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub label: String,
    pub kind: NodeKind,
    pub payload: NodePayload,
}

impl Node {
    pub fn new(label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            label: label.into(),
            kind,
            payload: NodePayload::None,
        }
    }

    pub fn role(label: impl Into<String>, grants: BTreeSet<Capability>) -> Self {
        Self {
            label: label.into(),
            kind: NodeKind::Role,
            payload: NodePayload::Grants(grants),
        }
    }

    pub fn typed_resource(label: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            label: label.into(),
            kind: NodeKind::Resource,
            payload: NodePayload::ResourceType(resource_type),
        }
    }

    /// Whether this node grants `capability`; false for anything but a role
    pub fn grants(&self, capability: Capability) -> bool {
        match &self.payload {
            NodePayload::Grants(set) => set.contains(&capability),
            _ => false,
        }
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        match self.payload {
            NodePayload::ResourceType(t) => Some(t),
            _ => None,
        }
    }
}
