//! Exact minimum-cost bipartite assignment (Hungarian algorithm).
//!
//! Shortest-augmenting-path formulation with dual potentials, `O(n^2 * m)`
//! time for an `n x m` matrix with `n <= m` (wider side handled by an
//! internal transpose), `O(n * m)` space. Globally optimal.
//!
//! # Contract
//!
//! - Input entries must be finite and non-negative; anything else is
//!   rejected with [`MatchError::InvalidCost`] before any work happens.
//! - An empty dimension yields an empty assignment.
//! - Exactly `min(n, m)` pairs are returned; rectangular matrices are
//!   treated as padded with a cost above every real entry, and padded
//!   pairs are never reported.
//! - Deterministic: columns are scanned in ascending order and candidates
//!   are replaced only on strictly smaller reduced cost, so ties resolve
//!   toward the lexicographically smallest `(i, j)` reachable first.
//!   Identical inputs always produce identical output.
//!
//! # Cancellation
//!
//! The solver checks the optional [`CancelToken`] between row augmentations
//! (its outer loop). On cancel it returns the token's error instead of a
//! partial result.

use crate::error::{MatchError, MatchResult};
use crate::orchestrator::cancel::CancelToken;

/// A minimum-cost assignment over a rectangular cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Matched `(row, column)` pairs, sorted lexicographically.
    pub pairs: Vec<(usize, usize)>,
    /// Sum of matrix entries over the matched pairs.
    pub total_cost: f64,
}

/// Solve the assignment problem for `cost` (rows x columns).
///
/// See the module docs for the full contract.
pub fn solve(cost: &[Vec<f64>], cancel: Option<&CancelToken>) -> MatchResult<Assignment> {
    let rows = cost.len();
    let cols = cost.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Ok(Assignment {
            pairs: Vec::new(),
            total_cost: 0.0,
        });
    }
    validate(cost, cols)?;

    // Internally rows must be the short side; transpose access if not.
    let transposed = rows > cols;
    let (n, m) = if transposed { (cols, rows) } else { (rows, cols) };
    let at = |i: usize, j: usize| -> f64 {
        if transposed {
            cost[j][i]
        } else {
            cost[i][j]
        }
    };

    // 1-based dual potentials and matching state; p[j] is the row matched
    // to column j, 0 meaning unmatched.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];
    let mut minv = vec![f64::INFINITY; m + 1];
    let mut used = vec![false; m + 1];

    for i in 1..=n {
        if let Some(token) = cancel {
            token.check()?;
        }

        p[0] = i;
        let mut j0 = 0usize;
        minv.iter_mut().for_each(|x| *x = f64::INFINITY);
        used.iter_mut().for_each(|x| *x = false);

        // Dijkstra-like search for the cheapest augmenting path from row i.
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = at(i0 - 1, j - 1) - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the matching along the found path.
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut pairs = Vec::with_capacity(n);
    for j in 1..=m {
        if p[j] != 0 {
            let (row, col) = if transposed {
                (j - 1, p[j] - 1)
            } else {
                (p[j] - 1, j - 1)
            };
            pairs.push((row, col));
        }
    }
    pairs.sort_unstable();

    let total_cost = pairs.iter().map(|&(r, c)| cost[r][c]).sum();
    Ok(Assignment { pairs, total_cost })
}

/// Reject ragged shapes and negative or non-finite entries.
fn validate(cost: &[Vec<f64>], cols: usize) -> MatchResult<()> {
    for (i, row) in cost.iter().enumerate() {
        if row.len() != cols {
            return Err(MatchError::InvalidInput {
                field: "cost_matrix".into(),
                reason: format!("row {i} has {} columns, expected {cols}", row.len()),
            });
        }
        for (j, &value) in row.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(MatchError::InvalidCost {
                    row: i,
                    col: j,
                    value,
                });
            }
        }
    }
    Ok(())
}
