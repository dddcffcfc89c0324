//! Team, TeamVector and team metrics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::Role;

/// Formation method tag for teams produced by the strict Phase 2 pipeline.
pub const FORMATION_STRICT_ENFORCEMENT: &str = "strict_enforcement";

/// Single-vector reduction of a team, used for team-level cost
/// computation in Phase 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamVector {
    /// Per-skill mean level over members (members without the skill
    /// contribute 0).
    pub avg_skill_levels: BTreeMap<String, f64>,
    /// Role distribution over the vocabulary; sums to 1 (or is empty).
    pub role_weights: BTreeMap<Role, f64>,
    /// Minimum of member availabilities.
    pub min_availability: u32,
    /// Mean motivation embedding, re-normalized to unit length when the
    /// mean is nonzero. Empty when no member carries an embedding.
    pub avg_motivation_embedding: Vec<f32>,
    /// Mean ambiguity comfort over members.
    pub avg_ambiguity_tolerance: f64,
    /// Mean normalized skill confidence in `[0, 1]`.
    pub avg_confidence_score: f64,
}

/// Deterministic quality metrics computed from team contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMetrics {
    /// Fraction of the role vocabulary represented by at least one member.
    pub role_coverage: f64,
    /// Importance-weighted skill coverage in `[0, 1]`.
    pub skills_covered: f64,
    /// Combined diversity score in `[0, 1]`.
    pub diversity_score: f64,
    /// True when no single role exceeds its size-dependent share.
    pub role_balance_flag: bool,
    /// Mean normalized skill confidence, clamped to `[0, 1]`.
    pub confidence_score: f64,
    /// Complementarity bonus, clamped to `[0, 1]`.
    pub synergy_score: f64,
}

/// A formed team of exactly `team_size` members.
///
/// Members are referenced by participant id only. Computed metrics are
/// authoritative; AI annotations are advisory and never feed the cost
/// model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Stable identifier.
    pub id: Uuid,
    /// Member participant ids, sorted ascending.
    pub member_ids: Vec<Uuid>,
    /// How the team was formed.
    pub formation_method: String,
    /// Problem assigned in Phase 3, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_problem: Option<Uuid>,
    /// Aggregated team vector.
    pub vector: TeamVector,
    /// Computed metrics.
    pub metrics: TeamMetrics,
    /// Set when leadership enforcement could not place a leader.
    pub leadership_missing: bool,
    /// Sum of pairwise affinity costs between members.
    pub internal_cost: f64,
    /// `internal_cost` divided by the number of member pairs.
    pub avg_pairwise_cost: f64,
    /// Advisory qualitative review from the annotation service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_review: Option<String>,
    /// Advisory fit score from the annotation service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_fit_score: Option<f64>,
}

impl Team {
    /// Number of members.
    pub fn size(&self) -> usize {
        self.member_ids.len()
    }
}
