//! Phase lifecycle orchestration.
//!
//! The orchestrator is the only component that translates kernel results
//! and I/O failures into phase status transitions. Status lives in the
//! repository, keyed by (run, phase); nothing lifecycle-relevant is kept
//! in process globals.
//!
//! # Split of responsibilities
//!
//! - [`PhaseOrchestrator`] is the caller-facing edge: `start`, `rerun`,
//!   `cancel`, `status`. It validates overrides, checks preconditions and
//!   enqueues a [`PhaseTask`] through the dispatcher.
//! - [`PhaseEngine`] executes a task: loads inputs (with bounded backoff),
//!   runs the synchronous kernel on a blocking worker under a cancel token
//!   and a wall-clock budget, persists the output, then flips the status.
//!
//! # Ordering guarantees
//!
//! A phase's output is fully written before its status transitions to
//! `completed`; observers never see `completed` without the output being
//! visible. Progress is monotonic within one execution. On cancel or
//! timeout no partial outputs are persisted.

pub mod cancel;
pub mod retry;

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{MatchConfig, PhaseOverrides};
use crate::cost::CostBreakdown;
use crate::error::{MatchError, MatchResult, PhaseFailure};
use crate::phases;
use crate::traits::{MatchRepository, PhaseTask, TaskDispatcher, TaskId};
use crate::types::{Phase, PhaseState, PhaseStatus};
use cancel::{CancelReason, CancelToken};
use retry::retry_with_backoff;

/// Executes phase tasks end to end.
///
/// Shared between the orchestrator (which needs the cancel registry) and
/// the dispatcher implementation that actually invokes [`Self::execute`].
pub struct PhaseEngine {
    repo: Arc<dyn MatchRepository>,
    base_config: MatchConfig,
    tokens: DashMap<(Uuid, Phase), CancelToken>,
    progress: DashMap<(Uuid, Phase), f64>,
}

impl PhaseEngine {
    /// Create an engine over a repository and the run's base config.
    pub fn new(repo: Arc<dyn MatchRepository>, base_config: MatchConfig) -> Arc<Self> {
        Arc::new(Self {
            repo,
            base_config,
            tokens: DashMap::new(),
            progress: DashMap::new(),
        })
    }

    /// The run's base configuration.
    pub fn base_config(&self) -> &MatchConfig {
        &self.base_config
    }

    /// Trip the cancel token of a queued/running phase execution.
    ///
    /// A no-op when the phase is not executing.
    pub fn cancel(&self, run_id: Uuid, phase: Phase) {
        if let Some(token) = self.tokens.get(&(run_id, phase)) {
            info!(%run_id, %phase, "cancel requested");
            token.cancel(CancelReason::Canceled);
        }
    }

    /// Execute one phase task to completion, recording the outcome in the
    /// phase status. Never returns an error: failures become `failed`
    /// status records.
    pub async fn execute(self: Arc<Self>, task: PhaseTask) {
        let key = (task.run_id, task.phase);
        let token = CancelToken::new();
        self.tokens.insert(key, token.clone());
        self.progress.insert(key, 0.0);

        let started_at = Utc::now();
        let running = PhaseStatus {
            state: PhaseState::Running,
            progress: 0.0,
            components: None,
            started_at: Some(started_at),
            completed_at: None,
            error: None,
        };
        if let Err(err) = self.write_status(task.run_id, task.phase, &running).await {
            error!(%err, run_id = %task.run_id, phase = %task.phase, "failed to mark phase running");
        }

        // Wall-clock budget; trips the same token as an explicit cancel.
        let budget = self.base_config.phase_budget;
        let watchdog = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(budget).await;
                token.cancel(CancelReason::Timeout);
            })
        };

        let result = self.run_task(&task, &token).await;
        watchdog.abort();

        match result {
            Ok(components) => {
                let status = PhaseStatus {
                    state: PhaseState::Completed,
                    progress: 1.0,
                    components,
                    started_at: Some(started_at),
                    completed_at: Some(Utc::now()),
                    error: None,
                };
                if let Err(err) = self.write_status(task.run_id, task.phase, &status).await {
                    error!(%err, run_id = %task.run_id, phase = %task.phase, "failed to mark phase completed");
                }
                info!(run_id = %task.run_id, phase = %task.phase, "phase completed");
            }
            Err(err) => {
                let failure = describe_failure(&err);
                let status = PhaseStatus {
                    state: PhaseState::Failed,
                    progress: self.progress.get(&key).map(|p| *p).unwrap_or(0.0),
                    components: None,
                    started_at: Some(started_at),
                    completed_at: Some(Utc::now()),
                    error: Some(failure),
                };
                if let Err(write_err) =
                    self.write_status(task.run_id, task.phase, &status).await
                {
                    error!(%write_err, run_id = %task.run_id, phase = %task.phase, "failed to mark phase failed");
                }
                warn!(%err, run_id = %task.run_id, phase = %task.phase, "phase failed");
            }
        }

        self.tokens.remove(&key);
    }

    /// Load inputs, run the kernel, persist the output. Returns the mean
    /// component decomposition for the status record.
    async fn run_task(
        &self,
        task: &PhaseTask,
        token: &CancelToken,
    ) -> MatchResult<Option<CostBreakdown>> {
        let config = self.base_config.with_overrides(&task.overrides)?;
        let run_id = task.run_id;

        match task.phase {
            Phase::Phase1 => {
                let participants =
                    retry_with_backoff("list_participants", || self.repo.list_participants())
                        .await?;
                let problems =
                    retry_with_backoff("list_problems", || self.repo.list_problems()).await?;
                for p in &participants {
                    p.validate(config.embedding_dim)?;
                }
                for q in &problems {
                    q.validate(config.embedding_dim)?;
                }
                self.report_progress(run_id, task.phase, 0.1).await;

                let output = run_blocking({
                    let config = config.clone();
                    let token = token.clone();
                    move || phases::run_phase1(&participants, &problems, &config, Some(&token))
                })
                .await?;
                self.report_progress(run_id, task.phase, 0.8).await;

                retry_with_backoff("save_phase1_output", || {
                    self.repo.save_phase1_output(run_id, &output)
                })
                .await?;
                self.invalidate_downstream(run_id, Phase::Phase1).await?;

                let breakdowns: Vec<CostBreakdown> =
                    output.assignments.iter().map(|a| a.breakdown).collect();
                Ok(CostBreakdown::mean_of(&breakdowns))
            }
            Phase::Phase2 => {
                let phase1 = retry_with_backoff("load_phase1_output", || {
                    self.repo.load_phase1_output(run_id)
                })
                .await?
                .ok_or(MatchError::PhasePreconditionUnmet {
                    phase: Phase::Phase2,
                    upstream: Phase::Phase1,
                    upstream_state: "output missing".into(),
                })?;
                let participants =
                    retry_with_backoff("list_participants", || self.repo.list_participants())
                        .await?;
                self.report_progress(run_id, task.phase, 0.1).await;

                let output = run_blocking({
                    let config = config.clone();
                    let token = token.clone();
                    move || phases::run_phase2(&phase1, &participants, &config, Some(&token))
                })
                .await?;
                self.report_progress(run_id, task.phase, 0.8).await;

                retry_with_backoff("save_phase2_output", || {
                    self.repo.save_phase2_output(run_id, &output)
                })
                .await?;
                self.invalidate_downstream(run_id, Phase::Phase2).await?;
                Ok(None)
            }
            Phase::Phase3 => {
                let phase2 = retry_with_backoff("load_phase2_output", || {
                    self.repo.load_phase2_output(run_id)
                })
                .await?
                .ok_or(MatchError::PhasePreconditionUnmet {
                    phase: Phase::Phase3,
                    upstream: Phase::Phase2,
                    upstream_state: "output missing".into(),
                })?;
                let problems =
                    retry_with_backoff("list_problems", || self.repo.list_problems()).await?;
                self.report_progress(run_id, task.phase, 0.1).await;

                let output = run_blocking({
                    let config = config.clone();
                    let token = token.clone();
                    move || phases::run_phase3(&phase2.teams, &problems, &config, Some(&token))
                })
                .await?;
                self.report_progress(run_id, task.phase, 0.8).await;

                retry_with_backoff("save_phase3_output", || {
                    self.repo.save_phase3_output(run_id, &output)
                })
                .await?;

                let breakdowns: Vec<CostBreakdown> =
                    output.assignments.iter().map(|a| a.breakdown).collect();
                Ok(CostBreakdown::mean_of(&breakdowns))
            }
        }
    }

    /// Clear every downstream output and reset its status to idle.
    async fn invalidate_downstream(&self, run_id: Uuid, phase: Phase) -> MatchResult<()> {
        for downstream in phase.downstream() {
            debug!(%run_id, phase = %downstream, "invalidating downstream output");
            retry_with_backoff("clear_phase_output", || {
                self.repo.clear_phase_output(run_id, *downstream)
            })
            .await?;
            let status = PhaseStatus::default();
            retry_with_backoff("reset_phase_status", || {
                self.repo.save_phase_status(run_id, *downstream, &status)
            })
            .await?;
        }
        Ok(())
    }

    /// Record progress, clamped monotonic per execution, best effort.
    async fn report_progress(&self, run_id: Uuid, phase: Phase, value: f64) {
        let key = (run_id, phase);
        let value = {
            let mut entry = self.progress.entry(key).or_insert(0.0);
            *entry = entry.max(value.clamp(0.0, 1.0));
            *entry
        };
        let started_at = match self.repo.load_phase_status(run_id, phase).await {
            Ok(Some(current)) => current.started_at,
            _ => None,
        };
        let status = PhaseStatus {
            state: PhaseState::Running,
            progress: value,
            components: None,
            started_at,
            completed_at: None,
            error: None,
        };
        // Progress is advisory; a failed write only logs.
        if let Err(err) = self.repo.save_phase_status(run_id, phase, &status).await {
            debug!(%err, %run_id, %phase, "progress write failed");
        }
    }

    async fn write_status(
        &self,
        run_id: Uuid,
        phase: Phase,
        status: &PhaseStatus,
    ) -> MatchResult<()> {
        retry_with_backoff("save_phase_status", || {
            self.repo.save_phase_status(run_id, phase, status)
        })
        .await
    }
}

/// Run a synchronous kernel on the blocking pool.
async fn run_blocking<T, F>(f: F) -> MatchResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> MatchResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => {
            std::panic::resume_unwind(join_err.into_panic())
        }
        // Runtime shutdown while the kernel ran.
        Err(_) => Err(MatchError::Canceled),
    }
}

/// Attach diagnostic counters where the error carries them.
fn describe_failure(err: &MatchError) -> PhaseFailure {
    let failure = PhaseFailure::from_error(err);
    match err {
        MatchError::InsufficientData {
            needed, available, ..
        } => failure
            .with_diagnostic("needed", *needed as u64)
            .with_diagnostic("available", *available as u64),
        _ => failure,
    }
}

/// Caller-facing phase lifecycle API.
pub struct PhaseOrchestrator {
    repo: Arc<dyn MatchRepository>,
    dispatcher: Arc<dyn TaskDispatcher>,
    engine: Arc<PhaseEngine>,
}

impl PhaseOrchestrator {
    /// Wire the orchestrator over its collaborators.
    pub fn new(
        repo: Arc<dyn MatchRepository>,
        dispatcher: Arc<dyn TaskDispatcher>,
        engine: Arc<PhaseEngine>,
    ) -> Self {
        Self {
            repo,
            dispatcher,
            engine,
        }
    }

    /// Start a phase for the first time in a run.
    ///
    /// Rejects with `PhaseBusy` when any phase of the run is in progress,
    /// `PhasePreconditionUnmet` when the upstream phase is not completed,
    /// and `InvalidInput` for bad overrides or a phase already in a
    /// terminal state (use [`Self::rerun`] for those).
    pub async fn start(
        &self,
        run_id: Uuid,
        phase: Phase,
        overrides: Option<PhaseOverrides>,
    ) -> MatchResult<TaskId> {
        let overrides = overrides.unwrap_or_default();
        self.engine.base_config().with_overrides(&overrides)?;
        self.ensure_run_quiet(run_id).await?;
        self.ensure_upstream_completed(run_id, phase).await?;

        let current = self.status(run_id, phase).await?;
        if current.state != PhaseState::Idle {
            return Err(MatchError::InvalidInput {
                field: "phase".into(),
                reason: format!(
                    "{phase} is {}; use rerun to execute it again",
                    current.state
                ),
            });
        }

        self.enqueue(run_id, phase, overrides).await
    }

    /// Re-execute a phase whose upstream is completed.
    ///
    /// Clears downstream outputs before enqueueing, so observers never see
    /// stale downstream results alongside a fresher upstream.
    pub async fn rerun(
        &self,
        run_id: Uuid,
        phase: Phase,
        overrides: Option<PhaseOverrides>,
    ) -> MatchResult<TaskId> {
        let overrides = overrides.unwrap_or_default();
        self.engine.base_config().with_overrides(&overrides)?;
        self.ensure_run_quiet(run_id).await?;
        self.ensure_upstream_completed(run_id, phase).await?;

        for downstream in phase.downstream() {
            retry_with_backoff("clear_phase_output", || {
                self.repo.clear_phase_output(run_id, *downstream)
            })
            .await?;
            let status = PhaseStatus::default();
            retry_with_backoff("reset_phase_status", || {
                self.repo.save_phase_status(run_id, *downstream, &status)
            })
            .await?;
        }

        self.enqueue(run_id, phase, overrides).await
    }

    /// Observable status of a phase; `idle` when never touched.
    pub async fn status(&self, run_id: Uuid, phase: Phase) -> MatchResult<PhaseStatus> {
        let status = retry_with_backoff("load_phase_status", || {
            self.repo.load_phase_status(run_id, phase)
        })
        .await?;
        Ok(status.unwrap_or_default())
    }

    /// Request cooperative cancellation of a queued/running phase.
    pub fn cancel(&self, run_id: Uuid, phase: Phase) {
        self.engine.cancel(run_id, phase);
    }

    async fn enqueue(
        &self,
        run_id: Uuid,
        phase: Phase,
        overrides: PhaseOverrides,
    ) -> MatchResult<TaskId> {
        let status = PhaseStatus::queued();
        retry_with_backoff("save_phase_status", || {
            self.repo.save_phase_status(run_id, phase, &status)
        })
        .await?;

        let task = PhaseTask {
            run_id,
            phase,
            overrides,
        };
        match self.dispatcher.enqueue(task).await {
            Ok(task_id) => {
                info!(%run_id, %phase, %task_id, "phase enqueued");
                Ok(task_id)
            }
            Err(err) => {
                // Roll the status back so the phase is not stuck queued.
                let _ = self
                    .repo
                    .save_phase_status(run_id, phase, &PhaseStatus::default())
                    .await;
                Err(err)
            }
        }
    }

    /// At most one phase runs at a time per pipeline run.
    async fn ensure_run_quiet(&self, run_id: Uuid) -> MatchResult<()> {
        for phase in Phase::ALL {
            if self.status(run_id, phase).await?.state.is_in_progress() {
                return Err(MatchError::PhaseBusy(phase));
            }
        }
        Ok(())
    }

    async fn ensure_upstream_completed(&self, run_id: Uuid, phase: Phase) -> MatchResult<()> {
        if let Some(upstream) = phase.upstream() {
            let state = self.status(run_id, upstream).await?.state;
            if state != PhaseState::Completed {
                return Err(MatchError::PhasePreconditionUnmet {
                    phase,
                    upstream,
                    upstream_state: state.to_string(),
                });
            }
        }
        Ok(())
    }
}
