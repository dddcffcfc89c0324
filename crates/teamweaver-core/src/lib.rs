//! Teamweaver Core Library
//!
//! Batch matchmaking engine that assigns a population of participants to a
//! set of problems and composes balanced teams around those problems.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types (`Participant`, `Problem`, `Team`, `TeamVector`, etc.)
//! - The five-term weighted cost model for individual and team matching
//! - An exact Hungarian solver for minimum-cost bipartite assignment
//! - The three phase kernels (bucket matching, team formation, final
//!   assignment) and the orchestrator that runs them
//! - Consumed-interface traits (`MatchRepository`, `EmbeddingProvider`,
//!   `TaskDispatcher`) and stub implementations for tests and local runs
//!
//! # Pipeline
//!
//! ```text
//! Participants, Problems
//!     -> Phase 1 (participant -> problem bucket, capacity-replicated Hungarian)
//!     -> Phase 2 (bucket -> teams of fixed size, k-medoids + slot filling)
//!     -> Phase 3 (team -> problem, one-to-one optimal)
//! ```
//!
//! Each phase persists its output through the repository so any later phase
//! can be rerun against the latest upstream output without redoing earlier
//! work.
//!
//! # Example
//!
//! ```
//! use teamweaver_core::config::MatchConfig;
//!
//! let config = MatchConfig::default();
//! assert_eq!(config.team_size, 5);
//! assert!(config.weights.validate().is_ok());
//! ```

pub mod aggregate;
pub mod config;
pub mod cost;
pub mod error;
pub mod orchestrator;
pub mod phases;
pub mod similarity;
pub mod solver;
pub mod stubs;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use config::{CostWeights, MatchConfig};
pub use error::{MatchError, MatchResult};
pub use orchestrator::PhaseOrchestrator;
pub use types::{Participant, Phase, PhaseState, PipelineRun, Problem, Role, Team};
