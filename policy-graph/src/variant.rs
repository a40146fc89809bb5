//! Variant configuration
//!
//! A variant is the combination of policy model, structure kind, and whether
//! ground-truth chains are injected. It replaces one script per combination.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Policy model that drives generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Abac,
    Ngac,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abac => write!(f, "abac"),
            Self::Ngac => write!(f, "ngac"),
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abac" => Ok(Self::Abac),
            "ngac" => Ok(Self::Ngac),
            other => Err(ModelError::UnsupportedVariant {
                message: format!("unknown model '{other}'"),
            }),
        }
    }
}

/// Relational structure the population is materialized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureKind {
    Graph,
    Hypergraph,
}

impl std::fmt::Display for StructureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graph => write!(f, "graph"),
            Self::Hypergraph => write!(f, "hypergraph"),
        }
    }
}

impl std::str::FromStr for StructureKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "graph" => Ok(Self::Graph),
            "hypergraph" => Ok(Self::Hypergraph),
            other => Err(ModelError::UnsupportedVariant {
                message: format!("unknown structure '{other}'"),
            }),
        }
    }
}

/// Which model, which structure, and whether ground truth is injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantConfig {
    pub model: ModelKind,
    pub structure: StructureKind,
    #[serde(default)]
    pub ground_truth: bool,
}

impl VariantConfig {
    pub fn new(model: ModelKind, structure: StructureKind, ground_truth: bool) -> Self {
        Self {
            model,
            structure,
            ground_truth,
        }
    }

    /// Reject combinations that have no construction rules
    pub fn validate(&self) -> ModelResult<()> {
        if self.model == ModelKind::Abac && self.structure == StructureKind::Hypergraph {
            return Err(ModelError::UnsupportedVariant {
                message: "the ABAC model is only defined over a directed graph".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VariantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.model, self.structure)?;
        if self.ground_truth {
            write!(f, "+gt")?;
        }
        Ok(())
    }
}

/// Population sizes for one sweep entry
///
/// Fields a model does not use are ignored by it. The NGAC attribute counts are
/// recorded with each result row but do not change the generated population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationSizes {
    pub principals: usize,
    pub roles: usize,
    pub resources: usize,
    pub permissions: usize,
    pub user_attributes: usize,
    pub resource_attributes: usize,
}

impl PopulationSizes {
    /// ABAC sizing tuple
    pub fn abac(principals: usize, roles: usize, resources: usize) -> Self {
        Self {
            principals,
            roles,
            resources,
            ..Self::default()
        }
    }

    /// NGAC sizing tuple
    pub fn ngac(
        principals: usize,
        user_attributes: usize,
        resources: usize,
        resource_attributes: usize,
        permissions: usize,
    ) -> Self {
        Self {
            principals,
            resources,
            permissions,
            user_attributes,
            resource_attributes,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abac_hypergraph_rejected() {
        let variant = VariantConfig::new(ModelKind::Abac, StructureKind::Hypergraph, true);
        let err = variant.validate().unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_VARIANT");

        assert!(VariantConfig::new(ModelKind::Abac, StructureKind::Graph, true)
            .validate()
            .is_ok());
        assert!(VariantConfig::new(ModelKind::Ngac, StructureKind::Hypergraph, false)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!("ABAC".parse::<ModelKind>().unwrap(), ModelKind::Abac);
        assert_eq!(
            "hypergraph".parse::<StructureKind>().unwrap(),
            StructureKind::Hypergraph
        );
        assert!("rbac".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_display() {
        let variant = VariantConfig::new(ModelKind::Ngac, StructureKind::Hypergraph, true);
        assert_eq!(variant.to_string(), "ngac-hypergraph+gt");
    }

    #[test]
    fn test_sizes_deserialize_with_defaults() {
        let sizes: PopulationSizes =
            serde_json::from_str(r#"{"principals": 100, "roles": 20, "resources": 30}"#).unwrap();
        assert_eq!(sizes, PopulationSizes::abac(100, 20, 30));
        assert_eq!(sizes.permissions, 0);
    }
}
