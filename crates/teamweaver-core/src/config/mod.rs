//! Run configuration: cost weights, team size, capacities, seeds.
//!
//! A [`MatchConfig`] is frozen at run start and threaded explicitly through
//! every kernel. Per-phase reruns apply a [`PhaseOverrides`] payload on top
//! of the run config; overrides are validated before any phase is queued.

pub mod constants;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{MatchError, MatchResult};
use constants::{
    DEFAULT_EMBEDDING_DIM, DEFAULT_PHASE_BUDGET, DEFAULT_RANDOM_SEED, DEFAULT_TEAM_SIZE,
    KMEDOIDS_MAX_ITER, MAX_TEAM_SIZE, MIN_TEAM_SIZE, WEIGHT_SUM_TOLERANCE,
};

/// Weights of the five cost terms. Must sum to exactly 1.0 (within
/// [`WEIGHT_SUM_TOLERANCE`]); each term must be a finite non-negative value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    /// Weight of the skill-gap term.
    pub skill_gap: f64,
    /// Weight of the role-alignment term.
    pub role_alignment: f64,
    /// Weight of the motivation-similarity term.
    pub motivation_similarity: f64,
    /// Weight of the ambiguity-fit term.
    pub ambiguity_fit: f64,
    /// Weight of the workload-fit term.
    pub workload_fit: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            skill_gap: 0.35,
            role_alignment: 0.20,
            motivation_similarity: 0.15,
            ambiguity_fit: 0.20,
            workload_fit: 0.10,
        }
    }
}

impl CostWeights {
    /// Validate that every weight is finite and non-negative and that the
    /// five weights sum to 1.0 within tolerance.
    pub fn validate(&self) -> MatchResult<()> {
        let terms = [
            ("skill_gap", self.skill_gap),
            ("role_alignment", self.role_alignment),
            ("motivation_similarity", self.motivation_similarity),
            ("ambiguity_fit", self.ambiguity_fit),
            ("workload_fit", self.workload_fit),
        ];
        for (name, value) in terms {
            if !value.is_finite() || value < 0.0 {
                return Err(MatchError::InvalidInput {
                    field: format!("weights.{name}"),
                    reason: format!("must be a finite non-negative number, got {value}"),
                });
            }
        }
        let sum: f64 = terms.iter().map(|(_, v)| v).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchError::InvalidInput {
                field: "weights".into(),
                reason: format!("must sum to 1.0, got {sum}"),
            });
        }
        Ok(())
    }
}

/// Frozen configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Members per team, in `[MIN_TEAM_SIZE, MAX_TEAM_SIZE]`.
    pub team_size: usize,
    /// Cost term weights.
    pub weights: CostWeights,
    /// Per-problem team-count multiplier. Problems absent from the map get
    /// the derived default `ceil(|P| / (team_size * |Q|))`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub per_problem_capacity: BTreeMap<Uuid, usize>,
    /// Seed for k-medoids initialization and heuristic tie-breaks.
    pub random_seed: u64,
    /// Expected motivation embedding dimension.
    pub embedding_dim: usize,
    /// Wall-clock budget per phase.
    #[serde(with = "duration_secs")]
    pub phase_budget: Duration,
    /// Maximum PAM refinement iterations.
    pub kmedoids_max_iter: usize,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs_f64().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            team_size: DEFAULT_TEAM_SIZE,
            weights: CostWeights::default(),
            per_problem_capacity: BTreeMap::new(),
            random_seed: DEFAULT_RANDOM_SEED,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            phase_budget: DEFAULT_PHASE_BUDGET,
            kmedoids_max_iter: KMEDOIDS_MAX_ITER,
        }
    }
}

impl MatchConfig {
    /// Validate the full configuration.
    pub fn validate(&self) -> MatchResult<()> {
        self.weights.validate()?;
        if self.team_size < MIN_TEAM_SIZE || self.team_size > MAX_TEAM_SIZE {
            return Err(MatchError::InvalidInput {
                field: "team_size".into(),
                reason: format!(
                    "must be in [{MIN_TEAM_SIZE}, {MAX_TEAM_SIZE}], got {}",
                    self.team_size
                ),
            });
        }
        if self.embedding_dim == 0 {
            return Err(MatchError::InvalidInput {
                field: "embedding_dim".into(),
                reason: "must be positive".into(),
            });
        }
        for (problem_id, multiplier) in &self.per_problem_capacity {
            if *multiplier == 0 {
                return Err(MatchError::InvalidInput {
                    field: "per_problem_capacity".into(),
                    reason: format!("multiplier for problem {problem_id} must be positive"),
                });
            }
        }
        Ok(())
    }

    /// Produce the effective config for a rerun by applying overrides.
    ///
    /// The result is validated; an invalid override rejects the rerun
    /// before anything is queued.
    pub fn with_overrides(&self, overrides: &PhaseOverrides) -> MatchResult<Self> {
        let mut effective = self.clone();
        if let Some(weights) = overrides.weights {
            effective.weights = weights;
        }
        if let Some(team_size) = overrides.team_size {
            effective.team_size = team_size;
        }
        if let Some(capacity) = &overrides.per_problem_capacity {
            effective.per_problem_capacity = capacity.clone();
        }
        if let Some(seed) = overrides.random_seed {
            effective.random_seed = seed;
        }
        effective.validate()?;
        Ok(effective)
    }
}

/// Parameter overrides recognized on `start`/`rerun`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseOverrides {
    /// Replacement cost weights; must sum to 1 within tolerance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<CostWeights>,
    /// Replacement team size in `[2, 10]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_size: Option<usize>,
    /// Replacement per-problem capacity multipliers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_problem_capacity: Option<BTreeMap<Uuid, usize>>,
    /// Replacement random seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl PhaseOverrides {
    /// True when no parameter is overridden.
    pub fn is_empty(&self) -> bool {
        self.weights.is_none()
            && self.team_size.is_none()
            && self.per_problem_capacity.is_none()
            && self.random_seed.is_none()
    }
}
