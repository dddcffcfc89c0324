//! Repository interface for snapshots, phase outputs and statuses.
//!
//! Storage is an opaque document-per-entity model; the core only needs
//! point lookup and full scan. The snapshot is read-only during a run.
//! Output writes are per-phase, non-overlapping and idempotent: a rerun
//! overwrites, and a phase's output is fully written before its status
//! transitions to `completed`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::MatchResult;
use crate::types::{
    Participant, Phase, Phase1Output, Phase2Output, Phase3Output, PhaseStatus, Problem,
};

/// Persistence seam consumed by the orchestrator.
///
/// Transient failures surface as [`crate::error::MatchError::StorageUnavailable`]
/// and are retried by the caller with bounded exponential backoff.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Full scan of the participant snapshot.
    async fn list_participants(&self) -> MatchResult<Vec<Participant>>;

    /// Full scan of the problem snapshot.
    async fn list_problems(&self) -> MatchResult<Vec<Problem>>;

    /// Replace the Phase 1 output for a run.
    async fn save_phase1_output(&self, run_id: Uuid, output: &Phase1Output) -> MatchResult<()>;

    /// Load the Phase 1 output for a run, when present.
    async fn load_phase1_output(&self, run_id: Uuid) -> MatchResult<Option<Phase1Output>>;

    /// Replace the Phase 2 output for a run.
    async fn save_phase2_output(&self, run_id: Uuid, output: &Phase2Output) -> MatchResult<()>;

    /// Load the Phase 2 output for a run, when present.
    async fn load_phase2_output(&self, run_id: Uuid) -> MatchResult<Option<Phase2Output>>;

    /// Replace the Phase 3 output for a run.
    async fn save_phase3_output(&self, run_id: Uuid, output: &Phase3Output) -> MatchResult<()>;

    /// Load the Phase 3 output for a run, when present.
    async fn load_phase3_output(&self, run_id: Uuid) -> MatchResult<Option<Phase3Output>>;

    /// Remove a phase's output for a run (downstream invalidation).
    async fn clear_phase_output(&self, run_id: Uuid, phase: Phase) -> MatchResult<()>;

    /// Replace the status record for a (run, phase).
    async fn save_phase_status(
        &self,
        run_id: Uuid,
        phase: Phase,
        status: &PhaseStatus,
    ) -> MatchResult<()>;

    /// Load the status record for a (run, phase); `None` means never
    /// touched, which readers treat as `idle`.
    async fn load_phase_status(
        &self,
        run_id: Uuid,
        phase: Phase,
    ) -> MatchResult<Option<PhaseStatus>>;
}
