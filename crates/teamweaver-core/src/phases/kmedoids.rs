//! k-medoids seeding for team formation (PAM).
//!
//! Operates on a precomputed symmetric pairwise cost matrix. Greedy PAM
//! initialization picks the point with the lowest mean cost to all others
//! first, then adds the point with the largest total cost reduction until
//! `k` medoids exist; a swap-refinement loop then improves the selection
//! until convergence or the iteration cap.
//!
//! Fully deterministic for a given matrix and seed: scans run in index
//! order, candidates are replaced only on strict improvement, and the
//! seeded RNG is touched only by the degenerate no-improvement fallback.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::MatchResult;
use crate::orchestrator::cancel::CancelToken;

/// Select `k` medoid indices for the given pairwise cost matrix.
///
/// Returns all indices when `k >= n`. The order of returned medoids is
/// the selection order, which downstream uses as the team order.
pub fn select_medoids(
    matrix: &[Vec<f64>],
    k: usize,
    max_iter: usize,
    rng: &mut ChaCha8Rng,
    cancel: Option<&CancelToken>,
) -> MatchResult<Vec<usize>> {
    let n = matrix.len();
    if k >= n {
        return Ok((0..n).collect());
    }
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut medoids = initialize(matrix, k, rng, cancel)?;

    for _ in 0..max_iter {
        if let Some(token) = cancel {
            token.check()?;
        }
        let mut improved = false;
        for position in 0..medoids.len() {
            let mut best_swap = None;
            let mut best_reduction = 0.0;
            for candidate in 0..n {
                if medoids.contains(&candidate) {
                    continue;
                }
                let reduction =
                    swap_reduction(matrix, &medoids, medoids[position], candidate);
                if reduction > best_reduction {
                    best_reduction = reduction;
                    best_swap = Some(candidate);
                }
            }
            if let Some(candidate) = best_swap {
                medoids[position] = candidate;
                improved = true;
            }
        }
        if !improved {
            break;
        }
    }

    Ok(medoids)
}

/// Greedy PAM initialization.
fn initialize(
    matrix: &[Vec<f64>],
    k: usize,
    rng: &mut ChaCha8Rng,
    cancel: Option<&CancelToken>,
) -> MatchResult<Vec<usize>> {
    let n = matrix.len();

    // First medoid: minimum mean cost to all others.
    let mut first = 0usize;
    let mut best_avg = f64::INFINITY;
    for i in 0..n {
        let total: f64 = (0..n).filter(|&j| j != i).map(|j| matrix[i][j]).sum();
        let avg = total / (n - 1).max(1) as f64;
        if avg < best_avg {
            best_avg = avg;
            first = i;
        }
    }
    let mut medoids = vec![first];

    // Remaining medoids: maximal total cost reduction.
    while medoids.len() < k {
        if let Some(token) = cancel {
            token.check()?;
        }
        let mut best_candidate = None;
        let mut best_reduction = 0.0;
        for candidate in 0..n {
            if medoids.contains(&candidate) {
                continue;
            }
            let reduction = addition_reduction(matrix, &medoids, candidate);
            if reduction > best_reduction {
                best_reduction = reduction;
                best_candidate = Some(candidate);
            }
        }
        match best_candidate {
            Some(candidate) => medoids.push(candidate),
            None => {
                // Degenerate geometry (e.g. all-zero costs): no candidate
                // reduces anything, fall back to a seeded pick.
                let available: Vec<usize> =
                    (0..n).filter(|i| !medoids.contains(i)).collect();
                match available.choose(rng) {
                    Some(&pick) => medoids.push(pick),
                    None => break,
                }
            }
        }
    }

    Ok(medoids)
}

/// Total cost reduction from adding `candidate` as a new medoid.
fn addition_reduction(matrix: &[Vec<f64>], medoids: &[usize], candidate: usize) -> f64 {
    let mut reduction = 0.0;
    for point in 0..matrix.len() {
        if point == candidate || medoids.contains(&point) {
            continue;
        }
        let current = medoids
            .iter()
            .map(|&m| matrix[point][m])
            .fold(f64::INFINITY, f64::min);
        let with_candidate = matrix[point][candidate];
        if with_candidate < current {
            reduction += current - with_candidate;
        }
    }
    reduction
}

/// Total cost change from swapping `old` out for `new` in the medoid set.
fn swap_reduction(matrix: &[Vec<f64>], medoids: &[usize], old: usize, new: usize) -> f64 {
    let swapped: Vec<usize> = medoids
        .iter()
        .map(|&m| if m == old { new } else { m })
        .collect();
    let mut change = 0.0;
    for point in 0..matrix.len() {
        if medoids.contains(&point) || point == new {
            continue;
        }
        let current = medoids
            .iter()
            .map(|&m| matrix[point][m])
            .fold(f64::INFINITY, f64::min);
        let after = swapped
            .iter()
            .map(|&m| matrix[point][m])
            .fold(f64::INFINITY, f64::min);
        change += current - after;
    }
    change
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    /// Two tight groups: {0,1} close, {2,3} close, groups far apart.
    fn two_clusters() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.1, 0.9, 0.8],
            vec![0.1, 0.0, 0.85, 0.9],
            vec![0.9, 0.85, 0.0, 0.1],
            vec![0.8, 0.9, 0.1, 0.0],
        ]
    }

    #[test]
    fn test_k_equals_n_returns_everything() {
        let medoids = select_medoids(&two_clusters(), 4, 100, &mut rng(), None).unwrap();
        assert_eq!(medoids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_k_zero_returns_empty() {
        let medoids = select_medoids(&two_clusters(), 0, 100, &mut rng(), None).unwrap();
        assert!(medoids.is_empty());
    }

    #[test]
    fn test_two_clusters_split() {
        let matrix = two_clusters();
        let medoids = select_medoids(&matrix, 2, 100, &mut rng(), None).unwrap();
        assert_eq!(medoids.len(), 2);
        // One medoid from each tight group.
        let group_a = medoids.iter().filter(|&&m| m < 2).count();
        let group_b = medoids.iter().filter(|&&m| m >= 2).count();
        assert_eq!((group_a, group_b), (1, 1));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let matrix = two_clusters();
        let a = select_medoids(&matrix, 2, 100, &mut rng(), None).unwrap();
        let b = select_medoids(&matrix, 2, 100, &mut rng(), None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_uniform_matrix_uses_fallback() {
        // All-equal costs: no greedy reduction exists anywhere, so the
        // seeded fallback fills the remaining medoids.
        let matrix = vec![vec![0.5; 6]; 6];
        let medoids = select_medoids(&matrix, 3, 100, &mut rng(), None).unwrap();
        assert_eq!(medoids.len(), 3);
        let unique: std::collections::BTreeSet<_> = medoids.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_canceled_token_aborts() {
        use crate::error::MatchError;
        use crate::orchestrator::cancel::CancelReason;
        let token = CancelToken::new();
        token.cancel(CancelReason::Canceled);
        let result = select_medoids(&two_clusters(), 2, 100, &mut rng(), Some(&token));
        assert!(matches!(result, Err(MatchError::Canceled)));
    }
}
