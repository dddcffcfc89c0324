//! Pairwise affinity cost between two participants (Phase 2).
//!
//! Lower is better: the cost rewards complementary roles and motivations
//! while penalizing redundant strong skills and clashing work rhythms.
//!
//! ```text
//! D[i,j] = 0.4 * role_diversity_penalty
//!        + 0.3 * skill_overlap_penalty
//!        + 0.3 * comm_style_clash
//!        - 0.2 * motivation_similarity
//! ```
//!
//! Each sub-term is normalized into `[0, 1]` and the combined value is
//! clamped back into `[0, 1]`.

use crate::config::constants::{
    MAX_SKILL_LEVEL, OVERLAP_LEVEL_THRESHOLD, PAIR_COMM_CLASH_WEIGHT, PAIR_MOTIVATION_BONUS,
    PAIR_ROLE_DIVERSITY_WEIGHT, PAIR_SKILL_OVERLAP_WEIGHT, WORKLOAD_NORM_HOURS,
};
use crate::similarity;
use crate::types::Participant;

/// Affinity cost between two participants, in `[0, 1]`.
///
/// Zero for a participant paired with itself.
pub fn pair_cost(a: &Participant, b: &Participant) -> f64 {
    if a.id == b.id {
        return 0.0;
    }
    let cost = PAIR_ROLE_DIVERSITY_WEIGHT * role_diversity_penalty(a, b)
        + PAIR_SKILL_OVERLAP_WEIGHT * skill_overlap_penalty(a, b)
        + PAIR_COMM_CLASH_WEIGHT * comm_style_clash(a, b)
        - PAIR_MOTIVATION_BONUS * motivation_similarity(a, b);
    cost.clamp(0.0, 1.0)
}

/// Penalty for role incompatibility: one minus the Jaccard overlap of the
/// two primary-role sets. Medium penalty when either side lists no roles.
fn role_diversity_penalty(a: &Participant, b: &Participant) -> f64 {
    if a.primary_roles.is_empty() || b.primary_roles.is_empty() {
        return 0.5;
    }
    let intersection = a
        .primary_roles
        .iter()
        .filter(|r| b.primary_roles.contains(*r))
        .count();
    let mut union: Vec<_> = a.primary_roles.clone();
    for r in &b.primary_roles {
        if !union.contains(r) {
            union.push(*r);
        }
    }
    1.0 - intersection as f64 / union.len() as f64
}

/// Penalty for redundant strength: over skills both hold above the
/// overlap threshold, the mean of `min(level_a, level_b) / 5` scaled by
/// how much of the larger skill set is shared.
fn skill_overlap_penalty(a: &Participant, b: &Participant) -> f64 {
    if a.skills.is_empty() || b.skills.is_empty() {
        return 0.0;
    }
    let mut common = 0usize;
    let mut overlap_sum = 0.0;
    let mut overlap_count = 0usize;
    for (skill, level_a) in &a.skills {
        if let Some(level_b) = b.skills.get(skill) {
            common += 1;
            let la = f64::from(*level_a);
            let lb = f64::from(*level_b);
            if la > OVERLAP_LEVEL_THRESHOLD && lb > OVERLAP_LEVEL_THRESHOLD {
                overlap_sum += la.min(lb) / f64::from(MAX_SKILL_LEVEL);
                overlap_count += 1;
            }
        }
    }
    if overlap_count == 0 {
        return 0.0;
    }
    let avg_overlap = overlap_sum / overlap_count as f64;
    let coverage = common as f64 / a.skills.len().max(b.skills.len()) as f64;
    avg_overlap * coverage
}

/// Availability-rhythm clash, normalized over the working-week span.
fn comm_style_clash(a: &Participant, b: &Participant) -> f64 {
    let diff = f64::from(a.availability_hours.abs_diff(b.availability_hours));
    (diff / WORKLOAD_NORM_HOURS).clamp(0.0, 1.0)
}

/// Cosine similarity of motivation embeddings, clamped to `[0, 1]`;
/// zero when either embedding is missing.
fn motivation_similarity(a: &Participant, b: &Participant) -> f64 {
    match similarity::cosine_similarity(&a.motivation_embedding, &b.motivation_embedding) {
        Ok(Some(cos)) => f64::from(cos.max(0.0)),
        Ok(None) | Err(_) => 0.0,
    }
}
