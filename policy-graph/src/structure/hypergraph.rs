//! Policy hypergraph
//!
//! Hyperedges are keyed sets of two or more registered node labels. A membership
//! index (label → incident hyperedge keys) is maintained on insert so incidence
//! lookups cost O(degree) rather than O(|E|).

use crate::error::{ModelError, ModelResult};
use crate::model::types::NodeKind;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What fact a hyperedge records; also the style key for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HyperedgeCategory {
    /// {principal, permission, resource}
    PrincipalBinding,
    /// Injected {principal, policy class}
    GroundTruth,
    /// {entity, attribute value}
    Attribute,
    /// {permission, resource}
    Grant,
    /// {resource, policy class}
    PolicyClass,
    /// Every principal and resource sharing one permission-mode set
    PermissionSet,
}

impl HyperedgeCategory {
    /// Key prefix used by the builders
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::PrincipalBinding => "Edge_User",
            Self::GroundTruth => "Edge_Truth",
            Self::Attribute | Self::Grant | Self::PolicyClass => "Edge",
            Self::PermissionSet => "Perm",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hyperedge {
    pub key: String,
    pub category: HyperedgeCategory,
    pub members: BTreeSet<String>,
}

impl Hyperedge {
    pub fn contains(&self, label: &str) -> bool {
        self.members.contains(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Hypergraph {
    nodes: BTreeMap<String, NodeKind>,
    edges: BTreeMap<String, Hyperedge>,
    memberships: HashMap<String, BTreeSet<String>>,
}

impl Hypergraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Registering the same label and kind again is a no-op.
    pub fn add_node(&mut self, label: impl Into<String>, kind: NodeKind) -> ModelResult<()> {
        let label = label.into();
        match self.nodes.get(&label) {
            Some(&existing) if existing != kind => Err(ModelError::ConflictingNode {
                label,
                existing,
                requested: kind,
            }),
            Some(_) => Ok(()),
            None => {
                self.nodes.insert(label, kind);
                Ok(())
            }
        }
    }

    /// Insert a hyperedge over registered labels
    pub fn add_hyperedge<I, S>(
        &mut self,
        key: impl Into<String>,
        category: HyperedgeCategory,
        members: I,
    ) -> ModelResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let members: BTreeSet<String> = members.into_iter().map(Into::into).collect();

        if self.edges.contains_key(&key) {
            return Err(ModelError::DuplicateHyperedge { key });
        }
        if members.len() < 2 {
            return Err(ModelError::DegenerateHyperedge {
                key,
                size: members.len(),
            });
        }
        if let Some(missing) = members.iter().find(|m| !self.nodes.contains_key(*m)) {
            return Err(ModelError::DanglingReference {
                label: missing.clone(),
                context: format!("hyperedge {key}"),
            });
        }

        for member in &members {
            self.memberships
                .entry(member.clone())
                .or_default()
                .insert(key.clone());
        }
        self.edges.insert(
            key.clone(),
            Hyperedge {
                key,
                category,
                members,
            },
        );
        Ok(())
    }

    pub fn node_kind(&self, label: &str) -> Option<NodeKind> {
        self.nodes.get(label).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, NodeKind)> {
        self.nodes.iter().map(|(label, kind)| (label.as_str(), *kind))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(label, _)| label.as_str())
    }

    pub fn hyperedge(&self, key: &str) -> Option<&Hyperedge> {
        self.edges.get(key)
    }

    pub fn hyperedges(&self) -> impl Iterator<Item = &Hyperedge> {
        self.edges.values()
    }

    /// Keys of hyperedges incident to `label`, from the membership index
    pub fn incident_keys(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.memberships.get(label)
    }

    /// Hyperedges incident to `label`, in key order
    pub fn incident_edges<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a Hyperedge> + 'a {
        self.memberships
            .get(label)
            .into_iter()
            .flatten()
            .filter_map(|key| self.edges.get(key))
    }

    /// Keys of hyperedges containing `label`, by scanning every hyperedge
    pub fn incident_keys_by_scan(&self, label: &str) -> BTreeSet<String> {
        self.edges
            .values()
            .filter(|edge| edge.contains(label))
            .map(|edge| edge.key.clone())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node count plus hyperedge count
    pub fn size(&self) -> usize {
        self.node_count() + self.edge_count()
    }

    /// Group grants by permission-mode set: one hyperedge per distinct set,
    /// containing every principal and resource holding exactly that set on
    /// some pair. The hyperedge key is the sorted mode string (`r`, `rw`, `rwx`).
    pub fn from_permission_sets(grants: &[PermissionGrant]) -> ModelResult<Self> {
        let mut hypergraph = Self::new();
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for grant in grants {
            hypergraph.add_node(grant.principal.as_str(), NodeKind::Principal)?;
            hypergraph.add_node(grant.resource.as_str(), NodeKind::Resource)?;
            let members = grouped.entry(grant.mode_label()).or_default();
            members.insert(grant.principal.clone());
            members.insert(grant.resource.clone());
        }

        for (label, members) in grouped {
            hypergraph.add_hyperedge(label, HyperedgeCategory::PermissionSet, members)?;
        }
        Ok(hypergraph)
    }
}

/// Access modes one principal holds on one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub principal: String,
    pub resource: String,
    pub modes: BTreeSet<char>,
}

impl PermissionGrant {
    pub fn new(principal: &str, resource: &str, modes: &str) -> Self {
        Self {
            principal: principal.to_string(),
            resource: resource.to_string(),
            modes: modes.chars().collect(),
        }
    }

    pub fn mode_label(&self) -> String {
        self.modes.iter().collect()
    }
}

/// Users and storage volumes with read/write/execute grants; `Root` holds
/// `rwx` on every volume.
pub fn sample_filesystem_grants() -> Vec<PermissionGrant> {
    let mut grants = vec![
        PermissionGrant::new("Alice", "ext4", "rwx"),
        PermissionGrant::new("Bob", "ext4", "r"),
        PermissionGrant::new("Bob", "NFS", "rw"),
        PermissionGrant::new("Alice", "NFS", "w"),
        PermissionGrant::new("Charlie", "NFS", "r"),
        PermissionGrant::new("Charlie", "SAN", "rx"),
        PermissionGrant::new("David", "SAN", "rw"),
        PermissionGrant::new("Bob", "SAN", "rw"),
        PermissionGrant::new("Alice", "RAID", "rw"),
        PermissionGrant::new("Charlie", "RAID", "r"),
        PermissionGrant::new("Bob", "RAID", "x"),
        PermissionGrant::new("Charlie", "ext4", "r"),
    ];
    for volume in ["ext4", "NFS", "SAN", "RAID"] {
        grants.push(PermissionGrant::new("Root", volume, "rwx"));
    }
    grants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Hypergraph {
        let mut h = Hypergraph::new();
        h.add_node("User_0", NodeKind::Principal).unwrap();
        h.add_node("iam:PassRole", NodeKind::Permission).unwrap();
        h.add_node("Resource_0", NodeKind::Resource).unwrap();
        h.add_node("EC2", NodeKind::PolicyClass).unwrap();
        h.add_hyperedge(
            "Edge_User_0",
            HyperedgeCategory::PrincipalBinding,
            ["User_0", "iam:PassRole", "Resource_0"],
        )
        .unwrap();
        h.add_hyperedge("Edge_1", HyperedgeCategory::PolicyClass, ["Resource_0", "EC2"])
            .unwrap();
        h
    }

    #[test]
    fn test_membership_index_matches_scan() {
        let h = triangle();
        for (label, _) in h.nodes() {
            let indexed: BTreeSet<String> =
                h.incident_keys(label).cloned().unwrap_or_default();
            assert_eq!(indexed, h.incident_keys_by_scan(label), "label {label}");
        }
        let keys: Vec<&str> = h
            .incident_edges("Resource_0")
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(keys, vec!["Edge_1", "Edge_User_0"]);
    }

    #[test]
    fn test_degenerate_and_duplicate_rejected() {
        let mut h = triangle();
        let err = h
            .add_hyperedge("Edge_9", HyperedgeCategory::Attribute, ["User_0", "User_0"])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DegenerateHyperedge {
                key: "Edge_9".to_string(),
                size: 1
            }
        );

        let err = h
            .add_hyperedge("Edge_1", HyperedgeCategory::Grant, ["User_0", "EC2"])
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_HYPEREDGE");
    }

    #[test]
    fn test_dangling_member_rejected() {
        let mut h = triangle();
        let err = h
            .add_hyperedge("Edge_2", HyperedgeCategory::Grant, ["User_0", "Resource_42"])
            .unwrap_err();
        assert!(err.is_construction_error());
        assert!(h.hyperedge("Edge_2").is_none());
        assert!(h.incident_keys_by_scan("User_0").len() == 1);
    }

    #[test]
    fn test_size_counts_nodes_and_edges() {
        let h = triangle();
        assert_eq!(h.node_count(), 4);
        assert_eq!(h.edge_count(), 2);
        assert_eq!(h.size(), 6);
    }

    #[test]
    fn test_permission_set_grouping() {
        let h = Hypergraph::from_permission_sets(&sample_filesystem_grants()).unwrap();
        let keys: Vec<&str> = h.hyperedges().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["r", "rw", "rwx", "rx", "w", "x"]);

        let rwx = h.hyperedge("rwx").unwrap();
        let expected: BTreeSet<String> = ["Alice", "Root", "ext4", "NFS", "SAN", "RAID"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(rwx.members, expected);
        assert_eq!(rwx.category, HyperedgeCategory::PermissionSet);

        // 5 users + 4 volumes
        assert_eq!(h.node_count(), 9);
        assert_eq!(h.node_kind("Root"), Some(NodeKind::Principal));
        assert_eq!(h.node_kind("SAN"), Some(NodeKind::Resource));
    }
}
