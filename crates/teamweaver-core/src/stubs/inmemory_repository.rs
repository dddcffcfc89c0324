//! In-memory implementation of `MatchRepository`.
//!
//! # TEST / LOCAL ONLY
//!
//! - No persistence: all data is lost when the store is dropped.
//! - Full scans are `O(n)` copies; fine for test-sized snapshots.
//! - Thread-safe via `DashMap`; no external locking needed.
//!
//! Supports transient-fault injection so orchestrator retry behavior can
//! be exercised: [`InMemoryRepository::fail_next_ops`] makes the next N
//! repository calls return `StorageUnavailable`.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{MatchError, MatchResult};
use crate::traits::MatchRepository;
use crate::types::{
    Participant, Phase, Phase1Output, Phase2Output, Phase3Output, PhaseStatus, Problem,
};

/// DashMap-backed repository for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    participants: DashMap<Uuid, Participant>,
    problems: DashMap<Uuid, Problem>,
    phase1: DashMap<Uuid, Phase1Output>,
    phase2: DashMap<Uuid, Phase2Output>,
    phase3: DashMap<Uuid, Phase3Output>,
    statuses: DashMap<(Uuid, Phase), PhaseStatus>,
    fail_budget: AtomicUsize,
}

impl InMemoryRepository {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the participant snapshot.
    pub fn insert_participant(&self, participant: Participant) {
        self.participants.insert(participant.id, participant);
    }

    /// Seed the problem snapshot.
    pub fn insert_problem(&self, problem: Problem) {
        self.problems.insert(problem.id, problem);
    }

    /// Make the next `n` repository operations fail transiently.
    pub fn fail_next_ops(&self, n: usize) {
        self.fail_budget.store(n, Ordering::SeqCst);
    }

    fn check_fault(&self) -> MatchResult<()> {
        let remaining = self
            .fail_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if remaining {
            Err(MatchError::StorageUnavailable(
                "injected transient fault".into(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MatchRepository for InMemoryRepository {
    async fn list_participants(&self) -> MatchResult<Vec<Participant>> {
        self.check_fault()?;
        let mut list: Vec<Participant> =
            self.participants.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|p| p.id);
        Ok(list)
    }

    async fn list_problems(&self) -> MatchResult<Vec<Problem>> {
        self.check_fault()?;
        let mut list: Vec<Problem> = self.problems.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|q| q.id);
        Ok(list)
    }

    async fn save_phase1_output(&self, run_id: Uuid, output: &Phase1Output) -> MatchResult<()> {
        self.check_fault()?;
        self.phase1.insert(run_id, output.clone());
        Ok(())
    }

    async fn load_phase1_output(&self, run_id: Uuid) -> MatchResult<Option<Phase1Output>> {
        self.check_fault()?;
        Ok(self.phase1.get(&run_id).map(|e| e.value().clone()))
    }

    async fn save_phase2_output(&self, run_id: Uuid, output: &Phase2Output) -> MatchResult<()> {
        self.check_fault()?;
        self.phase2.insert(run_id, output.clone());
        Ok(())
    }

    async fn load_phase2_output(&self, run_id: Uuid) -> MatchResult<Option<Phase2Output>> {
        self.check_fault()?;
        Ok(self.phase2.get(&run_id).map(|e| e.value().clone()))
    }

    async fn save_phase3_output(&self, run_id: Uuid, output: &Phase3Output) -> MatchResult<()> {
        self.check_fault()?;
        self.phase3.insert(run_id, output.clone());
        Ok(())
    }

    async fn load_phase3_output(&self, run_id: Uuid) -> MatchResult<Option<Phase3Output>> {
        self.check_fault()?;
        Ok(self.phase3.get(&run_id).map(|e| e.value().clone()))
    }

    async fn clear_phase_output(&self, run_id: Uuid, phase: Phase) -> MatchResult<()> {
        self.check_fault()?;
        match phase {
            Phase::Phase1 => self.phase1.remove(&run_id).map(|_| ()),
            Phase::Phase2 => self.phase2.remove(&run_id).map(|_| ()),
            Phase::Phase3 => self.phase3.remove(&run_id).map(|_| ()),
        };
        Ok(())
    }

    async fn save_phase_status(
        &self,
        run_id: Uuid,
        phase: Phase,
        status: &PhaseStatus,
    ) -> MatchResult<()> {
        self.check_fault()?;
        self.statuses.insert((run_id, phase), status.clone());
        Ok(())
    }

    async fn load_phase_status(
        &self,
        run_id: Uuid,
        phase: Phase,
    ) -> MatchResult<Option<PhaseStatus>> {
        self.check_fault()?;
        Ok(self.statuses.get(&(run_id, phase)).map(|e| e.value().clone()))
    }
}
