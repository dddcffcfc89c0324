//! Phase 2: partition each problem bucket into teams of fixed size.
//!
//! Strict enforcement: every emitted team has exactly `team_size` members.
//! A bucket whose size is not a multiple of the team size drops its
//! worst-ranked surplus back to the unassigned pool instead of emitting a
//! short team.
//!
//! Per bucket: k-medoids seeding on the pairwise affinity matrix, a single
//! Hungarian slot-fill over team-grouped columns with a role-coverage
//! pressure term, then leadership enforcement by swapping in an unassigned
//! leader where a team ended up without one.
//!
//! Buckets are independent and processed on a worker pool; outputs are
//! merged deterministically by problem id.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};
use uuid::Uuid;

use crate::aggregate;
use crate::config::constants::ROLE_PRESSURE_WEIGHT;
use crate::config::MatchConfig;
use crate::cost::pairwise::pair_cost;
use crate::error::{MatchError, MatchResult};
use crate::orchestrator::cancel::CancelToken;
use crate::phases::kmedoids;
use crate::solver;
use crate::types::{
    Participant, Phase1Output, Phase2Output, Team, FORMATION_STRICT_ENFORCEMENT,
};

/// Run Phase 2 over the Phase 1 buckets.
pub fn run_phase2(
    phase1: &Phase1Output,
    participants: &[Participant],
    config: &MatchConfig,
    cancel: Option<&CancelToken>,
) -> MatchResult<Phase2Output> {
    let by_id: std::collections::BTreeMap<Uuid, &Participant> =
        participants.iter().map(|p| (p.id, p)).collect();

    // Resolve buckets to participant refs, in problem-id order (BTreeMap).
    let mut bucket_inputs: Vec<(Uuid, Vec<&Participant>)> = Vec::new();
    for (problem_id, entries) in &phase1.buckets {
        let mut members = Vec::with_capacity(entries.len());
        for entry in entries {
            let participant =
                by_id
                    .get(&entry.participant_id)
                    .ok_or_else(|| MatchError::InvalidInput {
                        field: "phase1.buckets".into(),
                        reason: format!(
                            "participant {} not in snapshot",
                            entry.participant_id
                        ),
                    })?;
            members.push(*participant);
        }
        bucket_inputs.push((*problem_id, members));
    }

    let largest_bucket = bucket_inputs.iter().map(|(_, m)| m.len()).max().unwrap_or(0);

    debug!(
        buckets = bucket_inputs.len(),
        largest_bucket,
        team_size = config.team_size,
        "forming teams"
    );

    let results: MatchResult<Vec<(Vec<Team>, Vec<Uuid>)>> = bucket_inputs
        .into_par_iter()
        .map(|(problem_id, members)| form_bucket_teams(problem_id, members, config, cancel))
        .collect();
    let results = results?;

    let mut teams = Vec::new();
    let mut unassigned_pool = Vec::new();
    for (bucket_teams, surplus) in results {
        teams.extend(bucket_teams);
        unassigned_pool.extend(surplus);
    }

    if teams.is_empty() {
        return Err(MatchError::InsufficientData {
            needed: config.team_size,
            available: largest_bucket,
            context: "participants per bucket".into(),
        });
    }

    info!(
        teams = teams.len(),
        unassigned = unassigned_pool.len(),
        "phase 2 complete"
    );

    Ok(Phase2Output {
        teams,
        unassigned_pool,
    })
}

/// Form all teams for one bucket; returns the teams and the surplus pool.
fn form_bucket_teams(
    problem_id: Uuid,
    members: Vec<&Participant>,
    config: &MatchConfig,
    cancel: Option<&CancelToken>,
) -> MatchResult<(Vec<Team>, Vec<Uuid>)> {
    if let Some(token) = cancel {
        token.check()?;
    }

    let team_size = config.team_size;
    let team_count = members.len() / team_size;
    if team_count == 0 {
        return Ok((Vec::new(), members.iter().map(|m| m.id).collect()));
    }

    // Members arrive ordered by Phase 1 rank (best first); the surplus
    // that cannot fill a full team is the tail of that ordering.
    let kept = &members[..team_count * team_size];
    let mut pool: Vec<&Participant> = members[team_count * team_size..].to_vec();

    // Pairwise affinity matrix over kept members.
    let affinity: Vec<Vec<f64>> = kept
        .iter()
        .copied()
        .map(|a| kept.iter().copied().map(|b| pair_cost(a, b)).collect())
        .collect();

    // Independent deterministic RNG stream per bucket.
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&problem_id.as_bytes()[..8]);
    let mut rng =
        ChaCha8Rng::seed_from_u64(config.random_seed ^ u64::from_le_bytes(seed_bytes));

    let medoids = kmedoids::select_medoids(
        &affinity,
        team_count,
        config.kmedoids_max_iter,
        &mut rng,
        cancel,
    )?;

    // Slot matrix: columns grouped by team, `team_size` slots each. The
    // base cost is affinity to the team's medoid; the pressure term makes
    // each additional same-role slot in a team progressively dearer, which
    // spreads a role across teams.
    let slots = team_count * team_size;
    let matrix: Vec<Vec<f64>> = (0..kept.len())
        .map(|p| {
            (0..slots)
                .map(|col| {
                    let team = col / team_size;
                    let slot = col % team_size;
                    let base = affinity[p][medoids[team]];
                    let pressure = ROLE_PRESSURE_WEIGHT
                        * role_overlap(kept[p], kept[medoids[team]])
                        * slot as f64
                        / team_size as f64;
                    base + pressure
                })
                .collect()
        })
        .collect();

    let solution = solver::solve(&matrix, cancel)?;

    let mut rosters: Vec<Vec<&Participant>> = vec![Vec::new(); team_count];
    for &(row, col) in &solution.pairs {
        rosters[col / team_size].push(kept[row]);
    }

    let mut teams = Vec::with_capacity(team_count);
    for (team_idx, mut roster) in rosters.into_iter().enumerate() {
        let leadership_missing = enforce_leadership(&mut roster, &mut pool);

        let mut members_owned: Vec<Participant> =
            roster.iter().map(|m| (*m).clone()).collect();
        members_owned.sort_by_key(|m| m.id);

        let vector = aggregate::build_team_vector(&members_owned);
        let metrics = aggregate::compute_metrics(&members_owned);
        let (internal_cost, avg_pairwise_cost) = aggregate::internal_cost(&members_owned);

        teams.push(Team {
            id: Uuid::new_v5(&problem_id, &(team_idx as u32).to_le_bytes()),
            member_ids: members_owned.iter().map(|m| m.id).collect(),
            formation_method: FORMATION_STRICT_ENFORCEMENT.into(),
            assigned_problem: None,
            vector,
            metrics,
            leadership_missing,
            internal_cost,
            avg_pairwise_cost,
            ai_review: None,
            ai_fit_score: None,
        });
    }

    Ok((teams, pool.iter().map(|m| m.id).collect()))
}

/// Fraction of `p`'s primary roles that the medoid also holds.
fn role_overlap(p: &Participant, medoid: &Participant) -> f64 {
    if p.primary_roles.is_empty() {
        return 0.0;
    }
    let shared = p
        .primary_roles
        .iter()
        .filter(|r| medoid.primary_roles.contains(*r))
        .count();
    shared as f64 / p.primary_roles.len() as f64
}

/// Ensure the roster has a leadership-preferring member when feasible.
///
/// When the roster has no leader and the pool holds one, the pool leader
/// with the lowest incremental affinity cost replaces the roster member
/// with the highest affinity cost; the displaced member joins the pool.
/// Returns true when the roster remains leaderless.
fn enforce_leadership<'a>(
    roster: &mut Vec<&'a Participant>,
    pool: &mut Vec<&'a Participant>,
) -> bool {
    if roster.iter().any(|m| m.leadership_preference) {
        return false;
    }

    // Cheapest leader to bring in.
    let mut best_in: Option<(usize, f64)> = None;
    for (idx, candidate) in pool.iter().copied().enumerate() {
        if !candidate.leadership_preference {
            continue;
        }
        let cost = mean_cost_to(candidate, roster);
        let better = match best_in {
            None => true,
            Some((best_idx, best_cost)) => {
                cost < best_cost || (cost == best_cost && candidate.id < pool[best_idx].id)
            }
        };
        if better {
            best_in = Some((idx, cost));
        }
    }
    let Some((in_idx, _)) = best_in else {
        return true;
    };

    // Costliest member to let go.
    let mut out_idx = 0usize;
    let mut out_cost = f64::NEG_INFINITY;
    for (idx, member) in roster.iter().copied().enumerate() {
        let others: Vec<&Participant> = roster
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != idx)
            .map(|(_, m)| *m)
            .collect();
        let cost = mean_cost_to(member, &others);
        if cost > out_cost || (cost == out_cost && member.id < roster[out_idx].id) {
            out_cost = cost;
            out_idx = idx;
        }
    }

    let leader = pool.remove(in_idx);
    let displaced = std::mem::replace(&mut roster[out_idx], leader);
    pool.push(displaced);
    false
}

fn mean_cost_to(candidate: &Participant, roster: &[&Participant]) -> f64 {
    if roster.is_empty() {
        return 0.0;
    }
    roster
        .iter()
        .copied()
        .map(|m| pair_cost(candidate, m))
        .sum::<f64>()
        / roster.len() as f64
}
