//! In-process task dispatcher.
//!
//! Executes phase tasks by spawning the engine on the current tokio
//! runtime. Used by tests and local runs; deployments point the
//! orchestrator at an external queue instead.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::MatchResult;
use crate::orchestrator::PhaseEngine;
use crate::traits::{PhaseTask, TaskDispatcher, TaskId};

/// Dispatcher that runs tasks on the local runtime.
pub struct InlineDispatcher {
    engine: Arc<PhaseEngine>,
}

impl InlineDispatcher {
    /// Wrap an engine.
    pub fn new(engine: Arc<PhaseEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl TaskDispatcher for InlineDispatcher {
    async fn enqueue(&self, task: PhaseTask) -> MatchResult<TaskId> {
        let task_id = Uuid::new_v4();
        debug!(%task_id, run_id = %task.run_id, phase = %task.phase, "inline dispatch");
        let engine = Arc::clone(&self.engine);
        tokio::spawn(engine.execute(task));
        Ok(task_id)
    }
}
