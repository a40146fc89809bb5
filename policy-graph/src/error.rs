//! Policy model error types
//!
//! Construction errors are fatal for the repetition that raised them. Detection and
//! scoring operate on already-validated structures, so the only runtime error they
//! can raise is a strategy applied to the wrong structure kind.

use crate::model::types::NodeKind;
use thiserror::Error;

/// Result type alias for policy model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or traversing a policy structure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// An edge or hyperedge referenced a label that was never registered
    #[error("Dangling reference: {context} refers to unregistered node '{label}'")]
    DanglingReference { label: String, context: String },

    /// A label was registered twice under different kinds
    #[error("Node '{label}' already registered as {existing}, cannot re-register as {requested}")]
    ConflictingNode {
        label: String,
        existing: NodeKind,
        requested: NodeKind,
    },

    /// An edge violates the endpoint-kind rules
    #[error("Invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: String,
        to: String,
        reason: String,
    },

    /// A hyperedge must bind at least two nodes
    #[error("Hyperedge '{key}' has {size} member(s); at least 2 are required")]
    DegenerateHyperedge { key: String, size: usize },

    /// Hyperedge keys are identities and must be unique
    #[error("Hyperedge key '{key}' is already in use")]
    DuplicateHyperedge { key: String },

    /// The requested model/structure combination has no construction rules
    #[error("Unsupported variant: {message}")]
    UnsupportedVariant { message: String },

    /// A detection strategy was handed a structure it cannot traverse
    #[error("Strategy '{strategy}' cannot traverse a {structure}")]
    StructureMismatch {
        strategy: &'static str,
        structure: &'static str,
    },

    /// Generation parameters were out of range
    #[error("Invalid generation parameters: {message}")]
    InvalidParameters { message: String },
}

impl ModelError {
    /// Whether this error was raised while constructing the structure
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DanglingReference { .. }
                | Self::ConflictingNode { .. }
                | Self::InvalidEdge { .. }
                | Self::DegenerateHyperedge { .. }
                | Self::DuplicateHyperedge { .. }
        )
    }

    /// Machine-readable code for failure rows
    pub fn code(&self) -> &'static str {
        match self {
            Self::DanglingReference { .. } => "DANGLING_REFERENCE",
            Self::ConflictingNode { .. } => "CONFLICTING_NODE",
            Self::InvalidEdge { .. } => "INVALID_EDGE",
            Self::DegenerateHyperedge { .. } => "DEGENERATE_HYPEREDGE",
            Self::DuplicateHyperedge { .. } => "DUPLICATE_HYPEREDGE",
            Self::UnsupportedVariant { .. } => "UNSUPPORTED_VARIANT",
            Self::StructureMismatch { .. } => "STRUCTURE_MISMATCH",
            Self::InvalidParameters { .. } => "INVALID_PARAMETERS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference_display() {
        let err = ModelError::DanglingReference {
            label: "Role_99".to_string(),
            context: "edge from User_1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Role_99"));
        assert!(msg.contains("User_1"));
        assert!(err.is_construction_error());
        assert_eq!(err.code(), "DANGLING_REFERENCE");
    }

    #[test]
    fn test_mismatch_is_not_construction() {
        let err = ModelError::StructureMismatch {
            strategy: "pass_role_chain",
            structure: "hypergraph",
        };
        assert!(!err.is_construction_error());
        assert!(err.to_string().contains("pass_role_chain"));
    }
}
