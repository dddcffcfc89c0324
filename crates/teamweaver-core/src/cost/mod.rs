//! Weighted five-term cost model.
//!
//! Two pure functions with identical shape: [`cost_individual`] for a
//! (participant, problem) pair and [`cost_team`] for a (team vector,
//! problem) pair. Each produces a total plus its per-component
//! decomposition, so callers can report which term drove an assignment.
//!
//! Every component is normalized into `[0, 1]` before weighting; negative
//! intermediate values are clamped to 0. Floating-point accumulation
//! follows a fixed order (sorted map iteration, fixed term order), so the
//! same inputs always produce bit-identical totals.

pub mod pairwise;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::constants::{AMBIGUITY_SPAN, MAX_SKILL_LEVEL, WORKLOAD_NORM_HOURS};
use crate::config::CostWeights;
use crate::similarity;
use crate::types::{Participant, Problem, Role, TeamVector};

/// Per-component cost decomposition. Raw (unweighted) values in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Unmet required-skill gap.
    pub skill_gap: f64,
    /// Misalignment with the problem's role preference distribution.
    pub role_alignment: f64,
    /// Motivation embedding distance.
    pub motivation_similarity: f64,
    /// Ambiguity comfort vs. problem ambiguity distance.
    pub ambiguity_fit: f64,
    /// Workload exceeding availability.
    pub workload_fit: f64,
}

impl CostBreakdown {
    /// Weighted total of the five components.
    pub fn weighted_total(&self, weights: &CostWeights) -> f64 {
        weights.skill_gap * self.skill_gap
            + weights.role_alignment * self.role_alignment
            + weights.motivation_similarity * self.motivation_similarity
            + weights.ambiguity_fit * self.ambiguity_fit
            + weights.workload_fit * self.workload_fit
    }

    /// Component-wise mean over a set of breakdowns; `None` when empty.
    pub fn mean_of(breakdowns: &[CostBreakdown]) -> Option<CostBreakdown> {
        if breakdowns.is_empty() {
            return None;
        }
        let n = breakdowns.len() as f64;
        let mut acc = CostBreakdown::default();
        for b in breakdowns {
            acc.skill_gap += b.skill_gap;
            acc.role_alignment += b.role_alignment;
            acc.motivation_similarity += b.motivation_similarity;
            acc.ambiguity_fit += b.ambiguity_fit;
            acc.workload_fit += b.workload_fit;
        }
        acc.skill_gap /= n;
        acc.role_alignment /= n;
        acc.motivation_similarity /= n;
        acc.ambiguity_fit /= n;
        acc.workload_fit /= n;
        Some(acc)
    }
}

/// Cost of assigning one participant to one problem.
///
/// Returns the weighted total and the raw component breakdown.
pub fn cost_individual(
    participant: &Participant,
    problem: &Problem,
    weights: &CostWeights,
) -> (f64, CostBreakdown) {
    let role_support = uniform_role_support(&participant.primary_roles);
    let provided: BTreeMap<&str, f64> = participant
        .skills
        .iter()
        .map(|(k, v)| (k.as_str(), f64::from(*v)))
        .collect();

    let breakdown = CostBreakdown {
        skill_gap: skill_gap_component(&provided, &problem.required_skills),
        role_alignment: role_alignment_component(&role_support, &problem.role_preferences),
        motivation_similarity: motivation_component(
            &participant.motivation_embedding,
            &problem.embedding,
        ),
        ambiguity_fit: ambiguity_component(
            f64::from(participant.ambiguity_comfort),
            f64::from(problem.ambiguity_level),
        ),
        workload_fit: workload_component(
            f64::from(participant.availability_hours),
            f64::from(problem.estimated_hours),
        ),
    };
    (breakdown.weighted_total(weights), breakdown)
}

/// Cost of assigning one team (via its aggregated vector) to one problem.
pub fn cost_team(
    vector: &TeamVector,
    problem: &Problem,
    weights: &CostWeights,
) -> (f64, CostBreakdown) {
    let provided: BTreeMap<&str, f64> = vector
        .avg_skill_levels
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect();

    let breakdown = CostBreakdown {
        skill_gap: skill_gap_component(&provided, &problem.required_skills),
        role_alignment: role_alignment_component(&vector.role_weights, &problem.role_preferences),
        motivation_similarity: motivation_component(
            &vector.avg_motivation_embedding,
            &problem.embedding,
        ),
        ambiguity_fit: ambiguity_component(
            vector.avg_ambiguity_tolerance,
            f64::from(problem.ambiguity_level),
        ),
        workload_fit: workload_component(
            f64::from(vector.min_availability),
            f64::from(problem.estimated_hours),
        ),
    };
    (breakdown.weighted_total(weights), breakdown)
}

/// Uniform role distribution over a participant's primary roles.
fn uniform_role_support(roles: &[Role]) -> BTreeMap<Role, f64> {
    if roles.is_empty() {
        return BTreeMap::new();
    }
    let share = 1.0 / roles.len() as f64;
    let mut support = BTreeMap::new();
    for role in roles {
        // duplicate listings collapse onto one key
        *support.entry(*role).or_insert(0.0) += share;
    }
    support
}

/// Mean required-skill gap, normalized by the maximum level.
///
/// Missing skills count as provided = 0. No required skills means no gap.
fn skill_gap_component(provided: &BTreeMap<&str, f64>, required: &BTreeMap<String, u8>) -> f64 {
    if required.is_empty() {
        return 0.0;
    }
    let max_level = f64::from(MAX_SKILL_LEVEL);
    let mut sum = 0.0;
    for (skill, level) in required {
        let have = provided.get(skill.as_str()).copied().unwrap_or(0.0);
        sum += (f64::from(*level) - have).max(0.0) / max_level;
    }
    (sum / required.len() as f64).clamp(0.0, 1.0)
}

/// `1 - dot(normalize(support), preferences)`, clamped to `[0, 1]`.
///
/// Empty preferences (or empty support) contribute the full cost of 1.0.
fn role_alignment_component(
    support: &BTreeMap<Role, f64>,
    preferences: &BTreeMap<Role, f64>,
) -> f64 {
    if preferences.is_empty() || support.is_empty() {
        return 1.0;
    }
    let support_sum: f64 = support.values().sum();
    if support_sum <= 0.0 {
        return 1.0;
    }
    let mut dot = 0.0;
    for (role, weight) in support {
        if let Some(pref) = preferences.get(role) {
            dot += (weight / support_sum) * pref;
        }
    }
    (1.0 - dot).clamp(0.0, 1.0)
}

/// Cosine distance clamped at 0; a missing (zero) vector on either side
/// contributes the full cost of 1.0. A dimension mismatch is treated the
/// same way; snapshot validation rejects it before any phase runs.
fn motivation_component(a: &[f32], b: &[f32]) -> f64 {
    match similarity::cosine_similarity(a, b) {
        Ok(Some(cos)) => 1.0 - f64::from(cos.max(0.0)),
        Ok(None) | Err(_) => 1.0,
    }
}

/// Absolute ambiguity distance over the 1..=10 scale span.
fn ambiguity_component(tolerance: f64, ambiguity: f64) -> f64 {
    ((tolerance - ambiguity).abs() / AMBIGUITY_SPAN).clamp(0.0, 1.0)
}

/// Hours short of the problem's estimate, normalized and capped at 1.
fn workload_component(availability: f64, estimated_hours: f64) -> f64 {
    ((estimated_hours - availability).max(0.0) / WORKLOAD_NORM_HOURS).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn participant(roles: Vec<Role>, skills: &[(&str, u8)]) -> Participant {
        Participant {
            id: Uuid::new_v4(),
            full_name: "Test".into(),
            email: "t@example.com".into(),
            primary_roles: roles,
            skills: skills
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            availability_hours: 20,
            motivation_embedding: vec![],
            leadership_preference: false,
            ambiguity_comfort: 5,
        }
    }

    fn problem(required: &[(&str, u8)], prefs: &[(Role, f64)]) -> Problem {
        Problem {
            id: Uuid::new_v4(),
            title: "P".into(),
            prompt: "p".into(),
            estimated_team_size: 5,
            role_preferences: prefs.iter().copied().collect(),
            required_skills: required
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            ambiguity_level: 5,
            estimated_hours: 20,
            embedding: vec![],
        }
    }

    #[test]
    fn test_total_equals_weighted_components() {
        let p = participant(vec![Role::BackendDev], &[("python", 3)]);
        let q = problem(&[("python", 5), ("sql", 2)], &[(Role::BackendDev, 1.0)]);
        let weights = CostWeights::default();
        let (total, parts) = cost_individual(&p, &q, &weights);
        let recomputed = parts.weighted_total(&weights);
        assert!((total - recomputed).abs() < 1e-9);
    }

    #[test]
    fn test_skill_gap_missing_skill_counts_zero() {
        let p = participant(vec![Role::BackendDev], &[("python", 5)]);
        let q = problem(&[("python", 5), ("sql", 5)], &[]);
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        // python gap 0, sql gap 5/5 = 1; mean = 0.5
        assert!((parts.skill_gap - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_required_skills_no_gap() {
        let p = participant(vec![Role::BackendDev], &[]);
        let q = problem(&[], &[(Role::BackendDev, 1.0)]);
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert_eq!(parts.skill_gap, 0.0);
    }

    #[test]
    fn test_empty_role_preferences_full_cost() {
        let p = participant(vec![Role::Designer], &[]);
        let q = problem(&[], &[]);
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert_eq!(parts.role_alignment, 1.0);
    }

    #[test]
    fn test_perfect_role_alignment() {
        let p = participant(vec![Role::BackendDev], &[]);
        let q = problem(&[], &[(Role::BackendDev, 1.0)]);
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert!(parts.role_alignment.abs() < 1e-12);
    }

    #[test]
    fn test_split_role_support() {
        let p = participant(vec![Role::BackendDev, Role::FrontendDev], &[]);
        let q = problem(&[], &[(Role::BackendDev, 0.5), (Role::FrontendDev, 0.5)]);
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        // dot = 0.5*0.5 + 0.5*0.5 = 0.5
        assert!((parts.role_alignment - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_motivation_contributes_one() {
        let p = participant(vec![Role::BackendDev], &[]);
        let q = problem(&[], &[]);
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert_eq!(parts.motivation_similarity, 1.0);
    }

    #[test]
    fn test_identical_motivation_contributes_zero() {
        let mut p = participant(vec![Role::BackendDev], &[]);
        let mut q = problem(&[], &[]);
        p.motivation_embedding = vec![0.6, 0.8];
        q.embedding = vec![0.6, 0.8];
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert!(parts.motivation_similarity.abs() < 1e-6);
    }

    #[test]
    fn test_negative_cosine_clamped() {
        let mut p = participant(vec![Role::BackendDev], &[]);
        let mut q = problem(&[], &[]);
        p.motivation_embedding = vec![1.0, 0.0];
        q.embedding = vec![-1.0, 0.0];
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert!((parts.motivation_similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ambiguity_distance() {
        let mut p = participant(vec![Role::BackendDev], &[]);
        p.ambiguity_comfort = 1;
        let mut q = problem(&[], &[]);
        q.ambiguity_level = 10;
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert!((parts.ambiguity_fit - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_workload_capped_at_one() {
        let mut p = participant(vec![Role::BackendDev], &[]);
        p.availability_hours = 0;
        let mut q = problem(&[], &[]);
        q.estimated_hours = 100;
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert_eq!(parts.workload_fit, 1.0);
    }

    #[test]
    fn test_workload_surplus_free() {
        let mut p = participant(vec![Role::BackendDev], &[]);
        p.availability_hours = 40;
        let mut q = problem(&[], &[]);
        q.estimated_hours = 10;
        let (_, parts) = cost_individual(&p, &q, &CostWeights::default());
        assert_eq!(parts.workload_fit, 0.0);
    }

    #[test]
    fn test_team_cost_shape_matches_individual() {
        let vector = TeamVector {
            avg_skill_levels: BTreeMap::from([("python".into(), 4.0)]),
            role_weights: BTreeMap::from([(Role::BackendDev, 1.0)]),
            min_availability: 20,
            avg_motivation_embedding: vec![],
            avg_ambiguity_tolerance: 5.0,
            avg_confidence_score: 0.8,
        };
        let q = problem(&[("python", 5)], &[(Role::BackendDev, 1.0)]);
        let weights = CostWeights::default();
        let (total, parts) = cost_team(&vector, &q, &weights);
        assert!((total - parts.weighted_total(&weights)).abs() < 1e-9);
        assert!((parts.skill_gap - 0.2).abs() < 1e-12);
        assert!(parts.role_alignment.abs() < 1e-12);
    }

    #[test]
    fn test_determinism() {
        let p = participant(vec![Role::BackendDev, Role::DataScientist], &[("sql", 3)]);
        let q = problem(&[("sql", 4), ("python", 2)], &[(Role::DataScientist, 0.7)]);
        let weights = CostWeights::default();
        let (a, _) = cost_individual(&p, &q, &weights);
        let (b, _) = cost_individual(&p, &q, &weights);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
