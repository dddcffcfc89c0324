//! Problem snapshot type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::constants::{MAX_SKILL_LEVEL, MAX_TEAM_SIZE, MIN_TEAM_SIZE};
use crate::error::{MatchError, MatchResult};
use crate::types::Role;

/// One problem in the matching snapshot. Immutable within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Stable identifier.
    pub id: Uuid,
    /// Short title.
    pub title: String,
    /// Full textual prompt.
    pub prompt: String,
    /// Estimated team size in `[2, 10]`.
    pub estimated_team_size: usize,
    /// Role preference distribution; non-negative weights summing to <= 1.
    pub role_preferences: BTreeMap<Role, f64>,
    /// Skill name -> required minimum level in `[0, 5]`.
    pub required_skills: BTreeMap<String, u8>,
    /// Ambiguity level in `[1, 10]`.
    pub ambiguity_level: u8,
    /// Estimated weekly workload in hours.
    pub estimated_hours: u32,
    /// Problem embedding; unit-norm, or all-zero when missing.
    pub embedding: Vec<f32>,
}

impl Problem {
    /// Validate field ranges against the snapshot contract.
    pub fn validate(&self, embedding_dim: usize) -> MatchResult<()> {
        if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&self.estimated_team_size) {
            return Err(MatchError::InvalidInput {
                field: format!("problem[{}].estimated_team_size", self.id),
                reason: format!(
                    "expected [{MIN_TEAM_SIZE}, {MAX_TEAM_SIZE}], got {}",
                    self.estimated_team_size
                ),
            });
        }
        let mut weight_sum = 0.0;
        for (role, weight) in &self.role_preferences {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(MatchError::InvalidInput {
                    field: format!("problem[{}].role_preferences.{role}", self.id),
                    reason: format!("weight must be finite and non-negative, got {weight}"),
                });
            }
            weight_sum += weight;
        }
        // float precision slack, matching the intake contract
        if weight_sum > 1.0 + 1e-5 {
            return Err(MatchError::InvalidInput {
                field: format!("problem[{}].role_preferences", self.id),
                reason: format!("weights sum to {weight_sum}, must not exceed 1.0"),
            });
        }
        for (skill, level) in &self.required_skills {
            if *level > MAX_SKILL_LEVEL {
                return Err(MatchError::InvalidInput {
                    field: format!("problem[{}].required_skills.{skill}", self.id),
                    reason: format!("level {level} exceeds {MAX_SKILL_LEVEL}"),
                });
            }
        }
        if !(1..=10).contains(&self.ambiguity_level) {
            return Err(MatchError::InvalidInput {
                field: format!("problem[{}].ambiguity_level", self.id),
                reason: format!("expected [1, 10], got {}", self.ambiguity_level),
            });
        }
        if !self.embedding.is_empty() && self.embedding.len() != embedding_dim {
            return Err(MatchError::InvalidInput {
                field: format!("problem[{}].embedding", self.id),
                reason: format!(
                    "expected dimension {embedding_dim}, got {}",
                    self.embedding.len()
                ),
            });
        }
        if self.embedding.iter().any(|v| !v.is_finite()) {
            return Err(MatchError::InvalidInput {
                field: format!("problem[{}].embedding", self.id),
                reason: "contains a non-finite component".into(),
            });
        }
        Ok(())
    }
}
