//! Certifies the Hungarian solver against exhaustive search on small
//! matrices: the returned cost must never exceed the cost of any other
//! assignment of the same cardinality.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use teamweaver_core::solver;

/// Minimum total cost over all assignments of `min(n, m)` pairs, by
/// exhaustive recursion. Only viable for tiny matrices.
fn brute_force_min(cost: &[Vec<f64>]) -> f64 {
    let rows = cost.len();
    let cols = cost.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return 0.0;
    }

    // Recurse over rows when rows <= cols, otherwise over columns.
    if rows <= cols {
        let mut used = vec![false; cols];
        search_rows(cost, 0, &mut used)
    } else {
        let transposed: Vec<Vec<f64>> = (0..cols)
            .map(|j| (0..rows).map(|i| cost[i][j]).collect())
            .collect();
        let mut used = vec![false; rows];
        search_rows(&transposed, 0, &mut used)
    }
}

fn search_rows(cost: &[Vec<f64>], row: usize, used: &mut Vec<bool>) -> f64 {
    if row == cost.len() {
        return 0.0;
    }
    let mut best = f64::INFINITY;
    for col in 0..used.len() {
        if used[col] {
            continue;
        }
        used[col] = true;
        let candidate = cost[row][col] + search_rows(cost, row + 1, used);
        used[col] = false;
        if candidate < best {
            best = candidate;
        }
    }
    best
}

fn random_matrix(rng: &mut ChaCha8Rng, rows: usize, cols: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect()
}

#[test]
fn solver_matches_brute_force_on_square_matrices() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for n in 1..=8 {
        for _ in 0..20 {
            let cost = random_matrix(&mut rng, n, n);
            let solved = solver::solve(&cost, None).unwrap();
            let optimal = brute_force_min(&cost);
            assert!(
                (solved.total_cost - optimal).abs() < 1e-9,
                "{n}x{n}: solver {} vs brute force {optimal}",
                solved.total_cost
            );
        }
    }
}

#[test]
fn solver_matches_brute_force_on_rectangular_matrices() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let shapes = [(2, 5), (5, 2), (3, 8), (8, 3), (4, 6), (7, 5)];
    for (rows, cols) in shapes {
        for _ in 0..20 {
            let cost = random_matrix(&mut rng, rows, cols);
            let solved = solver::solve(&cost, None).unwrap();
            let optimal = brute_force_min(&cost);
            assert_eq!(solved.pairs.len(), rows.min(cols));
            assert!(
                (solved.total_cost - optimal).abs() < 1e-9,
                "{rows}x{cols}: solver {} vs brute force {optimal}",
                solved.total_cost
            );
        }
    }
}

#[test]
fn solver_never_reuses_rows_or_columns() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..50 {
        let rows = rng.gen_range(1..=8);
        let cols = rng.gen_range(1..=8);
        let cost = random_matrix(&mut rng, rows, cols);
        let solved = solver::solve(&cost, None).unwrap();

        let mut seen_rows = std::collections::BTreeSet::new();
        let mut seen_cols = std::collections::BTreeSet::new();
        for &(r, c) in &solved.pairs {
            assert!(r < rows && c < cols, "pair ({r}, {c}) out of bounds");
            assert!(seen_rows.insert(r), "row {r} used twice");
            assert!(seen_cols.insert(c), "column {c} used twice");
        }
    }
}

#[test]
fn solver_total_matches_pair_sum() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    for _ in 0..20 {
        let cost = random_matrix(&mut rng, 6, 6);
        let solved = solver::solve(&cost, None).unwrap();
        let sum: f64 = solved.pairs.iter().map(|&(r, c)| cost[r][c]).sum();
        assert!((solved.total_cost - sum).abs() < 1e-12);
    }
}
