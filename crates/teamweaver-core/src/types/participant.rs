//! Participant snapshot type and the closed role vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::constants::MAX_SKILL_LEVEL;
use crate::error::{MatchError, MatchResult};

/// Closed role vocabulary.
///
/// Roles are a tagged variant set, not open strings: an unknown role is an
/// `InvalidInput` at ingest, never a silent key. The vocabulary is the one
/// the intake form exposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FrontendDev,
    BackendDev,
    FullstackDev,
    DataScientist,
    DevopsEngineer,
    ProductManager,
    Designer,
}

/// Number of roles in the vocabulary.
pub const ROLE_COUNT: usize = 7;

impl Role {
    /// All roles, in canonical order.
    pub const ALL: [Role; ROLE_COUNT] = [
        Role::FrontendDev,
        Role::BackendDev,
        Role::FullstackDev,
        Role::DataScientist,
        Role::DevopsEngineer,
        Role::ProductManager,
        Role::Designer,
    ];

    /// Canonical snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FrontendDev => "frontend_dev",
            Role::BackendDev => "backend_dev",
            Role::FullstackDev => "fullstack_dev",
            Role::DataScientist => "data_scientist",
            Role::DevopsEngineer => "devops_engineer",
            Role::ProductManager => "product_manager",
            Role::Designer => "designer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| MatchError::InvalidInput {
                field: "role".into(),
                reason: format!("unknown role '{s}'"),
            })
    }
}

/// One participant in the matching snapshot.
///
/// Created by ingest, immutable within a pipeline run; phase outputs
/// reference participants by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier.
    pub id: Uuid,
    /// Full name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// 1-3 primary roles from the closed vocabulary, in stated order.
    pub primary_roles: Vec<Role>,
    /// Skill name -> self-rated proficiency in `[0, 5]`.
    pub skills: BTreeMap<String, u8>,
    /// Weekly availability in hours.
    pub availability_hours: u32,
    /// Motivation embedding; unit-norm, or all-zero when missing.
    pub motivation_embedding: Vec<f32>,
    /// Whether the participant wants to lead a team.
    pub leadership_preference: bool,
    /// Comfort with ambiguous problem statements, in `[1, 10]`.
    pub ambiguity_comfort: u8,
}

impl Participant {
    /// Validate field ranges against the snapshot contract.
    ///
    /// `embedding_dim` is the deployment-fixed motivation dimension; an
    /// empty embedding is accepted and treated as missing motivation.
    pub fn validate(&self, embedding_dim: usize) -> MatchResult<()> {
        if self.primary_roles.is_empty() || self.primary_roles.len() > 3 {
            return Err(MatchError::InvalidInput {
                field: format!("participant[{}].primary_roles", self.id),
                reason: format!("expected 1-3 roles, got {}", self.primary_roles.len()),
            });
        }
        for (skill, level) in &self.skills {
            if *level > MAX_SKILL_LEVEL {
                return Err(MatchError::InvalidInput {
                    field: format!("participant[{}].skills.{skill}", self.id),
                    reason: format!("level {level} exceeds {MAX_SKILL_LEVEL}"),
                });
            }
        }
        if !(1..=10).contains(&self.ambiguity_comfort) {
            return Err(MatchError::InvalidInput {
                field: format!("participant[{}].ambiguity_comfort", self.id),
                reason: format!("expected [1, 10], got {}", self.ambiguity_comfort),
            });
        }
        if !self.motivation_embedding.is_empty()
            && self.motivation_embedding.len() != embedding_dim
        {
            return Err(MatchError::InvalidInput {
                field: format!("participant[{}].motivation_embedding", self.id),
                reason: format!(
                    "expected dimension {embedding_dim}, got {}",
                    self.motivation_embedding.len()
                ),
            });
        }
        if self.motivation_embedding.iter().any(|v| !v.is_finite()) {
            return Err(MatchError::InvalidInput {
                field: format!("participant[{}].motivation_embedding", self.id),
                reason: "contains a non-finite component".into(),
            });
        }
        Ok(())
    }

    /// Mean of this participant's own skill ratings, 0.0 when none.
    pub fn mean_skill_level(&self) -> f64 {
        if self.skills.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.skills.values().map(|v| f64::from(*v)).sum();
        sum / self.skills.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Participant {
        Participant {
            id: Uuid::new_v4(),
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            primary_roles: vec![Role::BackendDev],
            skills: BTreeMap::from([("python".into(), 4), ("sql".into(), 2)]),
            availability_hours: 20,
            motivation_embedding: vec![],
            leadership_preference: true,
            ambiguity_comfort: 6,
        }
    }

    #[test]
    fn test_role_roundtrip() {
        for role in Role::ALL {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let err = "wizard".parse::<Role>().unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput { .. }));
    }

    #[test]
    fn test_valid_participant() {
        sample().validate(1536).unwrap();
    }

    #[test]
    fn test_too_many_roles_rejected() {
        let mut p = sample();
        p.primary_roles = vec![
            Role::BackendDev,
            Role::FrontendDev,
            Role::Designer,
            Role::DataScientist,
        ];
        assert!(p.validate(1536).is_err());
    }

    #[test]
    fn test_skill_level_out_of_range_rejected() {
        let mut p = sample();
        p.skills.insert("python".into(), 6);
        assert!(p.validate(1536).is_err());
    }

    #[test]
    fn test_embedding_dimension_checked() {
        let mut p = sample();
        p.motivation_embedding = vec![0.0; 3];
        assert!(p.validate(1536).is_err());
        p.motivation_embedding = vec![0.0; 1536];
        assert!(p.validate(1536).is_ok());
    }

    #[test]
    fn test_mean_skill_level() {
        let p = sample();
        assert!((p.mean_skill_level() - 3.0).abs() < 1e-12);
    }
}
