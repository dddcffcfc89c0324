//! Numeric constants shared across the matchmaking pipeline.

use std::time::Duration;

/// Default number of members per team.
pub const DEFAULT_TEAM_SIZE: usize = 5;

/// Inclusive bounds for a configurable team size.
pub const MIN_TEAM_SIZE: usize = 2;
/// Upper bound for a configurable team size.
pub const MAX_TEAM_SIZE: usize = 10;

/// Maximum self-rated or required skill level.
pub const MAX_SKILL_LEVEL: u8 = 5;

/// Span of the ambiguity scale (levels run 1..=10).
pub const AMBIGUITY_SPAN: f64 = 9.0;

/// Hours used to normalize workload gaps into [0, 1].
pub const WORKLOAD_NORM_HOURS: f64 = 40.0;

/// Embedding dimension for motivation vectors (fixed per deployment).
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Default seed for k-medoids initialization and heuristic tie-breaks.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Maximum PAM refinement iterations in Phase 2.
pub const KMEDOIDS_MAX_ITER: usize = 100;

/// Weight of the role-coverage pressure term in the Phase 2 slot matrix.
pub const ROLE_PRESSURE_WEIGHT: f64 = 0.25;

/// Pairwise affinity sub-term weights (Phase 2).
pub const PAIR_ROLE_DIVERSITY_WEIGHT: f64 = 0.4;
/// Weight of the skill-overlap penalty in the pairwise affinity cost.
pub const PAIR_SKILL_OVERLAP_WEIGHT: f64 = 0.3;
/// Weight of the communication-style clash in the pairwise affinity cost.
pub const PAIR_COMM_CLASH_WEIGHT: f64 = 0.3;
/// Weight of the motivation-similarity bonus in the pairwise affinity cost.
pub const PAIR_MOTIVATION_BONUS: f64 = 0.2;

/// Skill levels above this count toward the pairwise overlap penalty.
pub const OVERLAP_LEVEL_THRESHOLD: f64 = 3.0;

/// Bounded retry policy for transient repository errors.
pub const MAX_STORAGE_ATTEMPTS: u32 = 5;
/// Base delay for exponential backoff between storage attempts.
pub const STORAGE_BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Default wall-clock budget per phase.
pub const DEFAULT_PHASE_BUDGET: Duration = Duration::from_secs(300);

/// Weights-must-sum-to-one tolerance.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Fixed importance vocabulary for the weighted skill-coverage metric.
///
/// Skills outside this table do not contribute to `skills_covered`.
pub const SKILL_IMPORTANCE: &[(&str, f64)] = &[
    ("python", 1.0),
    ("javascript", 1.0),
    ("react", 0.9),
    ("sql", 0.9),
    ("machine_learning", 0.9),
    ("typescript", 0.8),
    ("aws", 0.8),
    ("gcp", 0.8),
    ("azure", 0.8),
    ("data_analysis", 0.8),
    ("nosql", 0.7),
    ("docker", 0.7),
    ("fastapi", 0.7),
    ("kubernetes", 0.6),
];
