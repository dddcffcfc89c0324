//! Phase 3: one-to-one team-to-problem assignment.
//!
//! Builds the team/problem cost matrix from aggregated team vectors and
//! runs the Hungarian solver once. Imbalance is not an error: with more
//! teams than problems (or vice versa) exactly `min(|T|, |Q|)` pairs are
//! emitted and the excess is reported unassigned.

use tracing::info;
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::cost::{cost_team, CostBreakdown};
use crate::error::{MatchError, MatchResult};
use crate::orchestrator::cancel::CancelToken;
use crate::solver;
use crate::types::{AssignmentStats, Phase3Output, Problem, Team, TeamAssignment};

/// Run Phase 3 over the formed teams and the problem snapshot.
pub fn run_phase3(
    teams: &[Team],
    problems: &[Problem],
    config: &MatchConfig,
    cancel: Option<&CancelToken>,
) -> MatchResult<Phase3Output> {
    if teams.is_empty() {
        return Err(MatchError::InsufficientData {
            needed: 1,
            available: 0,
            context: "teams".into(),
        });
    }
    if problems.is_empty() {
        return Err(MatchError::InsufficientData {
            needed: 1,
            available: 0,
            context: "problems".into(),
        });
    }

    let mut teams: Vec<&Team> = teams.iter().collect();
    teams.sort_by_key(|t| t.id);
    let mut problems: Vec<&Problem> = problems.iter().collect();
    problems.sort_by_key(|q| q.id);

    let mut costs: Vec<Vec<(f64, CostBreakdown)>> = Vec::with_capacity(teams.len());
    for team in &teams {
        if let Some(token) = cancel {
            token.check()?;
        }
        costs.push(
            problems
                .iter()
                .copied()
                .map(|problem| cost_team(&team.vector, problem, &config.weights))
                .collect(),
        );
    }
    let matrix: Vec<Vec<f64>> = costs
        .iter()
        .map(|row| row.iter().map(|(total, _)| *total).collect())
        .collect();

    let solution = solver::solve(&matrix, cancel)?;

    let mut assignments: Vec<TeamAssignment> = solution
        .pairs
        .iter()
        .map(|&(t, q)| TeamAssignment {
            team_id: teams[t].id,
            problem_id: problems[q].id,
            cost: costs[t][q].0,
            breakdown: costs[t][q].1,
        })
        .collect();
    assignments.sort_by_key(|a| a.team_id);

    let matched_teams: std::collections::BTreeSet<Uuid> =
        assignments.iter().map(|a| a.team_id).collect();
    let matched_problems: std::collections::BTreeSet<Uuid> =
        assignments.iter().map(|a| a.problem_id).collect();
    let unassigned_teams: Vec<Uuid> = teams
        .iter()
        .map(|t| t.id)
        .filter(|id| !matched_teams.contains(id))
        .collect();
    let unassigned_problems: Vec<Uuid> = problems
        .iter()
        .map(|q| q.id)
        .filter(|id| !matched_problems.contains(id))
        .collect();

    let pair_costs: Vec<f64> = assignments.iter().map(|a| a.cost).collect();
    let stats = AssignmentStats::from_costs(&pair_costs);

    info!(
        pairs = assignments.len(),
        unassigned_teams = unassigned_teams.len(),
        unassigned_problems = unassigned_problems.len(),
        mean_cost = stats.mean_cost,
        efficiency = stats.assignment_efficiency,
        "phase 3 complete"
    );

    Ok(Phase3Output {
        assignments,
        unassigned_teams,
        unassigned_problems,
        stats,
    })
}
