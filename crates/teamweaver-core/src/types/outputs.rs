//! Per-phase output records persisted through the repository.
//!
//! Outputs are replaced atomically per (run, phase); a rerun overwrites.
//! Every record is fully serializable so reruns of downstream phases can
//! consume the latest upstream output without recomputation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::cost::CostBreakdown;
use crate::types::Team;

/// One Phase 1 participant-to-problem-slot assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// Assigned participant.
    pub participant_id: Uuid,
    /// Owning problem of the matched column.
    pub problem_id: Uuid,
    /// Weighted total cost of the pair.
    pub cost: f64,
    /// Per-component decomposition of `cost`.
    pub breakdown: CostBreakdown,
    /// Rank within the problem's bucket, 0 = cheapest.
    pub rank: usize,
}

/// One bucket member, ordered by cost within the bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketEntry {
    /// Participant id.
    pub participant_id: Uuid,
    /// Individual cost against the bucket's problem.
    pub cost: f64,
    /// Rank within the bucket, 0 = cheapest.
    pub rank: usize,
}

/// Phase 1 result: problem buckets plus capacity diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase1Output {
    /// Every individual assignment, with cost decomposition.
    pub assignments: Vec<SlotAssignment>,
    /// Problem id -> bucket members ordered by rank.
    pub buckets: BTreeMap<Uuid, Vec<BucketEntry>>,
    /// Participants that did not fit any slot (capacity < population).
    pub unassigned_participants: Vec<Uuid>,
    /// Problem id -> number of unfilled slots (capacity > population).
    pub underfilled_problems: BTreeMap<Uuid, usize>,
    /// Sum of assignment costs.
    pub total_cost: f64,
}

/// Phase 2 result: formed teams plus the surplus pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase2Output {
    /// Teams of exactly the configured size, ordered by problem id then
    /// team id.
    pub teams: Vec<Team>,
    /// Participants dropped back to the unassigned pool.
    pub unassigned_pool: Vec<Uuid>,
}

/// One Phase 3 team-to-problem pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAssignment {
    /// Assigned team.
    pub team_id: Uuid,
    /// Matched problem.
    pub problem_id: Uuid,
    /// Weighted total cost of the pair.
    pub cost: f64,
    /// Per-component decomposition of `cost`.
    pub breakdown: CostBreakdown,
}

/// Aggregate statistics over a Phase 3 assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStats {
    /// Sum of pair costs.
    pub total_cost: f64,
    /// Mean pair cost.
    pub mean_cost: f64,
    /// Cheapest pair cost.
    pub min_cost: f64,
    /// Most expensive pair cost (worst case).
    pub max_cost: f64,
    /// `1 - mean_cost`, clamped to `[0, 1]`.
    pub assignment_efficiency: f64,
}

impl AssignmentStats {
    /// Compute statistics from a list of pair costs.
    ///
    /// All-zero statistics for an empty assignment.
    pub fn from_costs(costs: &[f64]) -> Self {
        if costs.is_empty() {
            return Self {
                total_cost: 0.0,
                mean_cost: 0.0,
                min_cost: 0.0,
                max_cost: 0.0,
                assignment_efficiency: 0.0,
            };
        }
        let total: f64 = costs.iter().sum();
        let mean = total / costs.len() as f64;
        let min = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let max = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            total_cost: total,
            mean_cost: mean,
            min_cost: min,
            max_cost: max,
            assignment_efficiency: (1.0 - mean).clamp(0.0, 1.0),
        }
    }
}

/// Phase 3 result: the final matching plus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase3Output {
    /// One-to-one team/problem pairs, ordered by team id.
    pub assignments: Vec<TeamAssignment>,
    /// Teams left unmatched when `|T| > |Q|`.
    pub unassigned_teams: Vec<Uuid>,
    /// Problems left unmatched when `|T| < |Q|`.
    pub unassigned_problems: Vec<Uuid>,
    /// Aggregate statistics.
    pub stats: AssignmentStats,
}
