//! Synthetic population generator
//!
//! Draws principals, roles, resources, permissions and policy classes from the
//! fixed enumerations in [`crate::model::types`], then optionally injects
//! ground-truth escalation chains that bypass the normal random assignment.
//! All randomness flows from one seeded `StdRng`, so a seed fully determines
//! the population.

use crate::error::{ModelError, ModelResult};
use crate::model::types::{
    Attribute, AttributeDomain, Capability, PolicyClass, ResourceType, JOB_TITLE,
    RESOURCE_ATTRIBUTES, USER_ATTRIBUTES,
};
use crate::variant::{ModelKind, PopulationSizes};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Ground truth: principal label → intermediate labels of the injected chain
pub type GroundTruth = BTreeMap<String, Vec<String>>;

/// Knobs for population generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeneratorOptions {
    /// Inject ground-truth chains
    pub ground_truth: bool,
    /// NGAC: probability that a principal receives a direct policy-class link
    pub ground_truth_rate: f64,
    /// ABAC: one chain per this many principals (at least one chain)
    pub principals_per_chain: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            ground_truth: false,
            ground_truth_rate: 0.3,
            principals_per_chain: 20,
        }
    }
}

impl GeneratorOptions {
    pub fn with_ground_truth(mut self, enabled: bool) -> Self {
        self.ground_truth = enabled;
        self
    }

    pub fn validate(&self) -> ModelResult<()> {
        if !(0.0..=1.0).contains(&self.ground_truth_rate) {
            return Err(ModelError::InvalidParameters {
                message: format!(
                    "ground_truth_rate must be within [0, 1], got {}",
                    self.ground_truth_rate
                ),
            });
        }
        if self.principals_per_chain == 0 {
            return Err(ModelError::InvalidParameters {
                message: "principals_per_chain must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Principal {
    pub label: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Role {
    pub label: String,
    pub grants: BTreeSet<Capability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbacResource {
    pub label: String,
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NgacResource {
    pub label: String,
    pub attributes: Vec<Attribute>,
}

/// A ground-truth chain to be wired verbatim by the builder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Injection {
    /// principal → elevated role → IAMRole resource → re-entry role
    RoleChain {
        principal: String,
        elevated_role: Role,
        pivot: AbacResource,
        reentry_role: Role,
    },
    /// principal → policy class
    PolicyClassLink {
        principal: String,
        policy_class: PolicyClass,
    },
}

impl Injection {
    pub fn principal(&self) -> &str {
        match self {
            Self::RoleChain { principal, .. } | Self::PolicyClassLink { principal, .. } => {
                principal
            }
        }
    }

    /// Labels after the principal, in chain order
    pub fn hops(&self) -> Vec<String> {
        match self {
            Self::RoleChain {
                elevated_role,
                pivot,
                reentry_role,
                ..
            } => vec![
                elevated_role.label.clone(),
                pivot.label.clone(),
                reentry_role.label.clone(),
            ],
            Self::PolicyClassLink { policy_class, .. } => vec![policy_class.label().to_string()],
        }
    }
}

/// Generated ABAC population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbacPopulation {
    pub principals: Vec<Principal>,
    pub roles: Vec<Role>,
    pub resources: Vec<AbacResource>,
    /// principal label → assigned role labels
    pub assignments: Vec<(String, Vec<String>)>,
    pub injections: Vec<Injection>,
    pub ground_truth: GroundTruth,
}

/// Generated NGAC population
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NgacPopulation {
    pub principals: Vec<Principal>,
    pub resources: Vec<NgacResource>,
    /// Drawn with replacement; duplicates collapse into one permission node
    pub permissions: Vec<Capability>,
    pub policy_classes: Vec<PolicyClass>,
    pub user_attribute_count: usize,
    pub resource_attribute_count: usize,
    pub injections: Vec<Injection>,
    pub ground_truth: GroundTruth,
}

impl NgacPopulation {
    /// Permission node labels, deduplicated, in first-drawn order
    pub fn distinct_permissions(&self) -> Vec<Capability> {
        let mut seen = BTreeSet::new();
        self.permissions
            .iter()
            .copied()
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum Population {
    Abac(AbacPopulation),
    Ngac(NgacPopulation),
}

impl Population {
    pub fn model(&self) -> ModelKind {
        match self {
            Self::Abac(_) => ModelKind::Abac,
            Self::Ngac(_) => ModelKind::Ngac,
        }
    }

    pub fn principal_count(&self) -> usize {
        match self {
            Self::Abac(p) => p.principals.len(),
            Self::Ngac(p) => p.principals.len(),
        }
    }

    pub fn ground_truth(&self) -> &GroundTruth {
        match self {
            Self::Abac(p) => &p.ground_truth,
            Self::Ngac(p) => &p.ground_truth,
        }
    }
}

/// Seeded population generator
pub struct ModelGenerator {
    rng: StdRng,
    options: GeneratorOptions,
}

impl ModelGenerator {
    pub fn new(seed: u64, options: GeneratorOptions) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            options,
        }
    }

    /// Generate a population for `model`
    pub fn generate(&mut self, model: ModelKind, sizes: &PopulationSizes) -> ModelResult<Population> {
        self.options.validate()?;
        let population = match model {
            ModelKind::Abac => {
                Population::Abac(self.generate_abac(sizes.principals, sizes.roles, sizes.resources))
            }
            ModelKind::Ngac => Population::Ngac(self.generate_ngac(sizes)),
        };
        debug!(
            model = %model,
            principals = population.principal_count(),
            ground_truth = population.ground_truth().len(),
            "Generated population"
        );
        Ok(population)
    }

    pub fn generate_abac(
        &mut self,
        num_principals: usize,
        num_roles: usize,
        num_resources: usize,
    ) -> AbacPopulation {
        let principals: Vec<Principal> = (0..num_principals)
            .map(|i| Principal {
                label: format!("User_{i}"),
                attributes: vec![draw_attribute(&JOB_TITLE, &mut self.rng)],
            })
            .collect();

        let roles: Vec<Role> = (0..num_roles)
            .map(|i| {
                let draws = self.rng.gen_range(1..=Capability::ALL.len());
                let grants = (0..draws)
                    .map(|_| Capability::ALL[self.rng.gen_range(0..Capability::ALL.len())])
                    .collect();
                Role {
                    label: format!("Role_{i}"),
                    grants,
                }
            })
            .collect();

        let resources: Vec<AbacResource> = (0..num_resources)
            .map(|i| AbacResource {
                label: format!("Resource_{i}"),
                resource_type: ResourceType::ALL[self.rng.gen_range(0..ResourceType::ALL.len())],
            })
            .collect();

        let assignments = principals
            .iter()
            .map(|principal| {
                let wanted = self.rng.gen_range(1..=3).min(roles.len());
                let assigned = roles
                    .choose_multiple(&mut self.rng, wanted)
                    .map(|r| r.label.clone())
                    .collect();
                (principal.label.clone(), assigned)
            })
            .collect();

        let mut injections = Vec::new();
        if self.options.ground_truth && !principals.is_empty() {
            let chains = (num_principals / self.options.principals_per_chain).max(1);
            for i in 0..chains {
                let principal = &principals[self.rng.gen_range(0..principals.len())];
                injections.push(Injection::RoleChain {
                    principal: principal.label.clone(),
                    elevated_role: Role {
                        label: format!("Role_GT_A_{i}"),
                        grants: BTreeSet::from([Capability::PassRole]),
                    },
                    pivot: AbacResource {
                        label: format!("Resource_GT_{i}"),
                        resource_type: ResourceType::IamRole,
                    },
                    reentry_role: Role {
                        label: format!("Role_GT_B_{i}"),
                        grants: BTreeSet::from([Capability::RunInstances]),
                    },
                });
            }
        }

        let ground_truth = record_ground_truth(&injections);
        AbacPopulation {
            principals,
            roles,
            resources,
            assignments,
            injections,
            ground_truth,
        }
    }

    pub fn generate_ngac(&mut self, sizes: &PopulationSizes) -> NgacPopulation {
        let principals: Vec<Principal> = (0..sizes.principals)
            .map(|i| Principal {
                label: format!("User_{i}"),
                attributes: USER_ATTRIBUTES
                    .iter()
                    .map(|domain| draw_attribute(domain, &mut self.rng))
                    .collect(),
            })
            .collect();

        let resources: Vec<NgacResource> = (0..sizes.resources)
            .map(|i| NgacResource {
                label: format!("Resource_{i}"),
                attributes: RESOURCE_ATTRIBUTES
                    .iter()
                    .map(|domain| draw_attribute(domain, &mut self.rng))
                    .collect(),
            })
            .collect();

        let permissions: Vec<Capability> = (0..sizes.permissions)
            .map(|_| Capability::ALL[self.rng.gen_range(0..Capability::ALL.len())])
            .collect();

        let policy_classes = PolicyClass::ALL.to_vec();

        let mut injections = Vec::new();
        if self.options.ground_truth {
            for principal in &principals {
                if self.rng.gen_bool(self.options.ground_truth_rate) {
                    let policy_class = policy_classes[self.rng.gen_range(0..policy_classes.len())];
                    injections.push(Injection::PolicyClassLink {
                        principal: principal.label.clone(),
                        policy_class,
                    });
                }
            }
        }

        let ground_truth = record_ground_truth(&injections);
        NgacPopulation {
            principals,
            resources,
            permissions,
            policy_classes,
            user_attribute_count: sizes.user_attributes,
            resource_attribute_count: sizes.resource_attributes,
            injections,
            ground_truth,
        }
    }
}

fn draw_attribute(domain: &AttributeDomain, rng: &mut StdRng) -> Attribute {
    Attribute {
        key: domain.key,
        value: domain.values[rng.gen_range(0..domain.values.len())],
    }
}

// A principal picked twice keeps its latest chain.
fn record_ground_truth(injections: &[Injection]) -> GroundTruth {
    injections
        .iter()
        .map(|inj| (inj.principal().to_string(), inj.hops()))
        .collect()
}
