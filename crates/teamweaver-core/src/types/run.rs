//! Pipeline run identity and per-phase lifecycle state.
//!
//! Phase status is an explicit value stored in the repository, not a
//! process global: a `PipelineRun` is threaded through the orchestrator
//! and every status read goes back to storage. Valid transitions:
//!
//! ```text
//! idle -> queued -> running -> {completed, failed}
//! {completed, failed} -> queued   (rerun only)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cost::CostBreakdown;
use crate::error::PhaseFailure;

/// One batch execution of the three-phase pipeline over a frozen snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Run identifier; phase outputs and statuses are keyed by it.
    pub id: Uuid,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
}

impl PipelineRun {
    /// Start a fresh run.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

/// The three pipeline phases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Participant -> problem bucket.
    Phase1,
    /// Bucket -> teams of fixed size.
    Phase2,
    /// Team -> problem, one-to-one.
    Phase3,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Phase; 3] = [Phase::Phase1, Phase::Phase2, Phase::Phase3];

    /// The phase whose output this phase consumes.
    pub fn upstream(&self) -> Option<Phase> {
        match self {
            Phase::Phase1 => None,
            Phase::Phase2 => Some(Phase::Phase1),
            Phase::Phase3 => Some(Phase::Phase2),
        }
    }

    /// Phases whose outputs are invalidated when this phase completes
    /// again, in pipeline order.
    pub fn downstream(&self) -> &'static [Phase] {
        match self {
            Phase::Phase1 => &[Phase::Phase2, Phase::Phase3],
            Phase::Phase2 => &[Phase::Phase3],
            Phase::Phase3 => &[],
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Phase1 => "phase1",
            Phase::Phase2 => "phase2",
            Phase::Phase3 => "phase3",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle state of one phase within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    /// Never started in this run.
    #[default]
    Idle,
    /// Accepted and enqueued for execution.
    Queued,
    /// Executing.
    Running,
    /// Finished; outputs are visible.
    Completed,
    /// Finished with an error; no outputs were written.
    Failed,
}

impl PhaseState {
    /// Whether a transition to `next` is legal.
    ///
    /// Terminal states may return to `Queued` via explicit rerun.
    pub fn can_transition_to(&self, next: PhaseState) -> bool {
        use PhaseState::*;
        matches!(
            (self, next),
            (Idle, Queued)
                | (Queued, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Queued, Failed)
                | (Completed, Queued)
                | (Failed, Queued)
        )
    }

    /// True for `Queued` or `Running`.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, PhaseState::Queued | PhaseState::Running)
    }
}

impl std::fmt::Display for PhaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PhaseState::Idle => "idle",
            PhaseState::Queued => "queued",
            PhaseState::Running => "running",
            PhaseState::Completed => "completed",
            PhaseState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Observable status of one phase. Small and append-friendly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseStatus {
    /// Current lifecycle state.
    pub state: PhaseState,
    /// Progress in `[0, 1]`; monotonic within a run of the phase.
    pub progress: f64,
    /// Mean per-component cost decomposition of the phase result, once
    /// known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<CostBreakdown>,
    /// When the phase entered `Running`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the phase reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure payload, populated when `state == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PhaseFailure>,
}

impl PhaseStatus {
    /// Fresh `Queued` status, clearing any previous terminal data.
    pub fn queued() -> Self {
        Self {
            state: PhaseState::Queued,
            progress: 0.0,
            components: None,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::Phase1.upstream(), None);
        assert_eq!(Phase::Phase2.upstream(), Some(Phase::Phase1));
        assert_eq!(Phase::Phase3.upstream(), Some(Phase::Phase2));
        assert_eq!(Phase::Phase1.downstream(), &[Phase::Phase2, Phase::Phase3]);
        assert!(Phase::Phase3.downstream().is_empty());
    }

    #[test]
    fn test_legal_transitions() {
        use PhaseState::*;
        assert!(Idle.can_transition_to(Queued));
        assert!(Queued.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));
        assert!(Completed.can_transition_to(Queued));
        assert!(Failed.can_transition_to(Queued));
    }

    #[test]
    fn test_illegal_transitions() {
        use PhaseState::*;
        assert!(!Idle.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Running.can_transition_to(Queued));
        assert!(!Failed.can_transition_to(Completed));
    }

    #[test]
    fn test_status_serde_roundtrip() {
        let status = PhaseStatus::queued();
        let json = serde_json::to_string(&status).unwrap();
        let back: PhaseStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
