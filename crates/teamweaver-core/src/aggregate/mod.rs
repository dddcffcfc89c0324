//! Team aggregation: reduce a team to a single vector and score it.
//!
//! Everything here is a deterministic pure function of the team contents.
//! Members are sorted by id before any floating-point accumulation, so the
//! result is invariant under permutation of the input slice.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::constants::{MAX_SKILL_LEVEL, SKILL_IMPORTANCE};
use crate::cost::pairwise::pair_cost;
use crate::types::{Participant, Role, TeamMetrics, TeamVector, ROLE_COUNT};

/// Build the aggregated [`TeamVector`] for a set of members.
///
/// An empty slice yields an all-empty vector; phases never produce empty
/// teams, this is purely defensive plumbing for callers like tests.
pub fn build_team_vector(members: &[Participant]) -> TeamVector {
    let members = sorted_by_id(members);
    let count = members.len();
    if count == 0 {
        return TeamVector {
            avg_skill_levels: BTreeMap::new(),
            role_weights: BTreeMap::new(),
            min_availability: 0,
            avg_motivation_embedding: Vec::new(),
            avg_ambiguity_tolerance: 0.0,
            avg_confidence_score: 0.0,
        };
    }

    // Per-skill mean; members without a skill contribute level 0.
    let mut skill_sums: BTreeMap<String, f64> = BTreeMap::new();
    for member in &members {
        for (skill, level) in &member.skills {
            *skill_sums.entry(skill.clone()).or_insert(0.0) += f64::from(*level);
        }
    }
    let avg_skill_levels: BTreeMap<String, f64> = skill_sums
        .into_iter()
        .map(|(skill, sum)| (skill, sum / count as f64))
        .collect();

    // Role distribution over all role listings, normalized to sum 1.
    let mut role_counts: BTreeMap<Role, usize> = BTreeMap::new();
    let mut total_listings = 0usize;
    for member in &members {
        for role in &member.primary_roles {
            *role_counts.entry(*role).or_insert(0) += 1;
            total_listings += 1;
        }
    }
    let role_weights: BTreeMap<Role, f64> = if total_listings == 0 {
        BTreeMap::new()
    } else {
        role_counts
            .into_iter()
            .map(|(role, n)| (role, n as f64 / total_listings as f64))
            .collect()
    };

    let min_availability = members
        .iter()
        .map(|m| m.availability_hours)
        .min()
        .unwrap_or(0);

    // Mean motivation over members that carry one; renormalized to unit
    // length when nonzero.
    let present: Vec<&[f32]> = members
        .iter()
        .filter(|m| !crate::similarity::is_zero(&m.motivation_embedding))
        .map(|m| m.motivation_embedding.as_slice())
        .collect();
    let avg_motivation_embedding = match crate::similarity::mean_pool(&present) {
        Ok(mut mean) => {
            crate::similarity::normalize(&mut mean);
            mean
        }
        Err(_) => Vec::new(),
    };

    let avg_ambiguity_tolerance = members
        .iter()
        .map(|m| f64::from(m.ambiguity_comfort))
        .sum::<f64>()
        / count as f64;

    let avg_confidence_score = members
        .iter()
        .map(|m| m.mean_skill_level() / f64::from(MAX_SKILL_LEVEL))
        .sum::<f64>()
        / count as f64;

    TeamVector {
        avg_skill_levels,
        role_weights,
        min_availability,
        avg_motivation_embedding,
        avg_ambiguity_tolerance,
        avg_confidence_score,
    }
}

/// Compute the quality metrics for a set of members.
pub fn compute_metrics(members: &[Participant]) -> TeamMetrics {
    let members = sorted_by_id(members);
    let team_size = members.len();
    if team_size == 0 {
        return TeamMetrics {
            role_coverage: 0.0,
            skills_covered: 0.0,
            diversity_score: 0.0,
            role_balance_flag: false,
            confidence_score: 0.0,
            synergy_score: 0.0,
        };
    }

    let distinct_roles: BTreeSet<Role> = members
        .iter()
        .flat_map(|m| m.primary_roles.iter().copied())
        .collect();
    let role_coverage = distinct_roles.len() as f64 / ROLE_COUNT as f64;

    let skills_covered = weighted_skill_coverage(&members);

    let distinct_skills: BTreeSet<&str> = members
        .iter()
        .flat_map(|m| m.skills.keys().map(String::as_str))
        .collect();

    let role_bonus = (0.1 * distinct_roles.len() as f64).min(0.3);
    let skill_bonus = (0.1 * distinct_skills.len() as f64 / team_size as f64).min(0.2);
    let diversity_score =
        (0.6 * role_coverage + 0.4 * skills_covered + role_bonus + skill_bonus).min(1.0);

    let role_balance_flag = role_balance(&members, team_size);

    let confidence_score = (members
        .iter()
        .map(|m| m.mean_skill_level() / f64::from(MAX_SKILL_LEVEL))
        .sum::<f64>()
        / team_size as f64)
        .clamp(0.0, 1.0);

    let synergy_score = synergy(&members, team_size);

    TeamMetrics {
        role_coverage,
        skills_covered,
        diversity_score,
        role_balance_flag,
        confidence_score,
        synergy_score,
    }
}

/// Sum of pairwise affinity costs and the mean per pair.
pub fn internal_cost(members: &[Participant]) -> (f64, f64) {
    let members = sorted_by_id(members);
    let n = members.len();
    if n <= 1 {
        return (0.0, 0.0);
    }
    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            total += pair_cost(members[i], members[j]);
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    (total, total / pairs)
}

/// Importance-weighted coverage over the fixed skill vocabulary:
/// `sum(w_s * max_member_level_s / 5) / sum(w_s)`.
fn weighted_skill_coverage(members: &[&Participant]) -> f64 {
    let mut covered = 0.0;
    let mut total_weight = 0.0;
    for (skill, weight) in SKILL_IMPORTANCE {
        total_weight += weight;
        let best = members
            .iter()
            .filter_map(|m| m.skills.get(*skill))
            .map(|l| f64::from(*l))
            .fold(0.0, f64::max);
        covered += weight * best / f64::from(MAX_SKILL_LEVEL);
    }
    if total_weight > 0.0 {
        (covered / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// No single role may exceed `ceil(team_size * tau)` members, with tau
/// relaxed for small teams.
fn role_balance(members: &[&Participant], team_size: usize) -> bool {
    let tau = if team_size <= 2 {
        1.0
    } else if team_size <= 4 {
        0.75
    } else {
        0.60
    };
    let threshold = (team_size as f64 * tau).ceil() as usize;

    let mut counts: BTreeMap<Role, usize> = BTreeMap::new();
    for member in members {
        for role in &member.primary_roles {
            *counts.entry(*role).or_insert(0) += 1;
        }
    }
    counts.values().all(|&n| n <= threshold)
}

/// Complementarity bonus: low skill overlap plus role spread.
fn synergy(members: &[&Participant], team_size: usize) -> f64 {
    if team_size <= 1 {
        return 0.0;
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut overlap = 0usize;
    let mut total = 0usize;
    for member in members {
        for skill in member.skills.keys() {
            if seen.contains(skill.as_str()) {
                overlap += 1;
            }
        }
        seen.extend(member.skills.keys().map(String::as_str));
        total += member.skills.len();
    }
    let skill_bonus = if total > 0 {
        (0.1 * (1.0 - overlap as f64 / total as f64)).max(0.0)
    } else {
        0.0
    };

    let distinct_roles: BTreeSet<Role> = members
        .iter()
        .flat_map(|m| m.primary_roles.iter().copied())
        .collect();
    let role_bonus = (0.05 * distinct_roles.len() as f64 / team_size as f64).min(0.1);

    (skill_bonus + role_bonus).clamp(0.0, 1.0)
}

fn sorted_by_id(members: &[Participant]) -> Vec<&Participant> {
    let mut sorted: Vec<&Participant> = members.iter().collect();
    sorted.sort_by_key(|m| m.id);
    sorted
}
