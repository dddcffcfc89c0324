//! Phase 1: assign each participant to a problem bucket.
//!
//! Capacity is enforced by column replication: each problem contributes
//! `team_count * team_size` identical columns to the cost matrix, and one
//! Hungarian run produces a globally optimal participant-to-slot matching.
//! Columns are then folded back onto their owning problems.

use std::collections::BTreeMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::cost::{cost_individual, CostBreakdown};
use crate::error::{MatchError, MatchResult};
use crate::orchestrator::cancel::CancelToken;
use crate::solver;
use crate::types::{BucketEntry, Participant, Phase1Output, Problem, SlotAssignment};

/// Run Phase 1 over the frozen snapshot.
///
/// The per-problem team count defaults to `ceil(|P| / (S * |Q|))` and can
/// be overridden per problem through the config.
pub fn run_phase1(
    participants: &[Participant],
    problems: &[Problem],
    config: &MatchConfig,
    cancel: Option<&CancelToken>,
) -> MatchResult<Phase1Output> {
    if participants.is_empty() {
        return Err(MatchError::InsufficientData {
            needed: 1,
            available: 0,
            context: "participants".into(),
        });
    }
    if problems.is_empty() {
        return Err(MatchError::InsufficientData {
            needed: 1,
            available: 0,
            context: "problems".into(),
        });
    }

    let mut participants: Vec<&Participant> = participants.iter().collect();
    participants.sort_by_key(|p| p.id);
    let mut problems: Vec<&Problem> = problems.iter().collect();
    problems.sort_by_key(|q| q.id);

    let team_size = config.team_size;
    let default_teams = participants.len().div_ceil(team_size * problems.len()).max(1);

    // Column layout: consecutive blocks of team_count * team_size
    // identical slots per problem, in problem-id order.
    let mut slot_owner: Vec<usize> = Vec::new();
    let mut slots_per_problem: Vec<usize> = Vec::with_capacity(problems.len());
    for (q_idx, problem) in problems.iter().enumerate() {
        let team_count = config
            .per_problem_capacity
            .get(&problem.id)
            .copied()
            .unwrap_or(default_teams);
        let slots = team_count * team_size;
        slots_per_problem.push(slots);
        slot_owner.extend(std::iter::repeat(q_idx).take(slots));
    }

    debug!(
        participants = participants.len(),
        problems = problems.len(),
        slots = slot_owner.len(),
        "building phase 1 cost matrix"
    );

    // One cost evaluation per (participant, problem); replicated columns
    // reuse it.
    let mut pair_costs: Vec<Vec<(f64, CostBreakdown)>> =
        Vec::with_capacity(participants.len());
    for participant in participants.iter().copied() {
        if let Some(token) = cancel {
            token.check()?;
        }
        let row = problems
            .iter()
            .copied()
            .map(|problem| cost_individual(participant, problem, &config.weights))
            .collect();
        pair_costs.push(row);
    }

    let matrix: Vec<Vec<f64>> = pair_costs
        .iter()
        .map(|row| slot_owner.iter().map(|&q| row[q].0).collect())
        .collect();

    let solution = solver::solve(&matrix, cancel)?;

    // Fold slots back onto problems.
    let mut assigned: Vec<(usize, usize)> = Vec::with_capacity(solution.pairs.len());
    let mut filled_per_problem = vec![0usize; problems.len()];
    for &(row, col) in &solution.pairs {
        let q_idx = slot_owner[col];
        assigned.push((row, q_idx));
        filled_per_problem[q_idx] += 1;
    }

    // Rank within each problem by cost ascending, participant id as the
    // deterministic tie-break.
    let mut buckets: BTreeMap<Uuid, Vec<BucketEntry>> = BTreeMap::new();
    let mut assignments: Vec<SlotAssignment> = Vec::with_capacity(assigned.len());
    for (q_idx, problem) in problems.iter().enumerate() {
        let mut entries: Vec<(usize, f64)> = assigned
            .iter()
            .filter(|(_, q)| *q == q_idx)
            .map(|&(row, _)| (row, pair_costs[row][q_idx].0))
            .collect();
        entries.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| participants[a.0].id.cmp(&participants[b.0].id))
        });

        let bucket: Vec<BucketEntry> = entries
            .iter()
            .enumerate()
            .map(|(rank, &(row, cost))| BucketEntry {
                participant_id: participants[row].id,
                cost,
                rank,
            })
            .collect();
        for (rank, &(row, cost)) in entries.iter().enumerate() {
            assignments.push(SlotAssignment {
                participant_id: participants[row].id,
                problem_id: problem.id,
                cost,
                breakdown: pair_costs[row][q_idx].1,
                rank,
            });
        }
        if !bucket.is_empty() {
            buckets.insert(problem.id, bucket);
        }
    }

    let assigned_rows: std::collections::BTreeSet<usize> =
        assigned.iter().map(|&(row, _)| row).collect();
    let unassigned_participants: Vec<Uuid> = participants
        .iter()
        .enumerate()
        .filter(|(row, _)| !assigned_rows.contains(row))
        .map(|(_, p)| p.id)
        .collect();

    let underfilled_problems: BTreeMap<Uuid, usize> = problems
        .iter()
        .enumerate()
        .filter_map(|(q_idx, problem)| {
            let missing = slots_per_problem[q_idx] - filled_per_problem[q_idx];
            (missing > 0).then_some((problem.id, missing))
        })
        .collect();

    info!(
        assigned = assignments.len(),
        unassigned = unassigned_participants.len(),
        underfilled = underfilled_problems.len(),
        total_cost = solution.total_cost,
        "phase 1 complete"
    );

    Ok(Phase1Output {
        assignments,
        buckets,
        unassigned_participants,
        underfilled_problems,
        total_cost: solution.total_cost,
    })
}
