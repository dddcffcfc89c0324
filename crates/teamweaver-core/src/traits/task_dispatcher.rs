//! Background task dispatch seam.
//!
//! The orchestrator enqueues one task per phase execution. At-least-once
//! delivery is sufficient: phase outputs are written idempotently by
//! (run id, phase), so a duplicate execution converges to the same state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PhaseOverrides;
use crate::error::MatchResult;
use crate::types::Phase;

/// Opaque dispatch ticket.
pub type TaskId = Uuid;

/// One phase execution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTask {
    /// Run the phase belongs to.
    pub run_id: Uuid,
    /// Which phase to execute.
    pub phase: Phase,
    /// Parameter overrides for this execution.
    #[serde(default)]
    pub overrides: PhaseOverrides,
}

/// Dispatch seam between the orchestrator edge and the execution
/// substrate (in-process for tests and local runs, an external queue in
/// deployment).
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Enqueue a phase execution. Returns a ticket for correlation; the
    /// orchestrator does not await completion through it.
    async fn enqueue(&self, task: PhaseTask) -> MatchResult<TaskId>;
}
