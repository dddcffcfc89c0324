//! RocksDB-backed `MatchRepository`.

use std::path::Path;

use async_trait::async_trait;
use rocksdb::{ColumnFamily, IteratorMode, Options, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use teamweaver_core::error::MatchResult;
use teamweaver_core::traits::MatchRepository;
use teamweaver_core::types::{
    Participant, Phase, Phase1Output, Phase2Output, Phase3Output, PhaseStatus, Problem,
};

use crate::column_families::{cf_names, column_family_descriptors, run_phase_key};
use crate::error::StorageError;

/// Persistent repository over RocksDB.
///
/// # Example
/// ```rust,ignore
/// use teamweaver_storage::RocksDbRepository;
/// use tempfile::TempDir;
///
/// let tmp = TempDir::new().unwrap();
/// let repo = RocksDbRepository::open(tmp.path()).unwrap();
/// ```
pub struct RocksDbRepository {
    db: DB,
}

impl RocksDbRepository {
    /// Open (or create) the database at `path` with all column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(&db_opts, &path_str, column_family_descriptors())
            .map_err(|e| StorageError::OpenFailed {
                path: path_str.clone(),
                message: e.to_string(),
            })?;

        info!(path = %path_str, "opened matchmaking store");
        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound {
                name: name.to_string(),
            })
    }

    fn put_json<T: Serialize>(
        &self,
        cf_name: &str,
        key: &[u8],
        value: &T,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.db
            .put_cf(self.cf(cf_name)?, key, bytes)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>, StorageError> {
        let bytes = self
            .db
            .get_cf(self.cf(cf_name)?, key)
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        match bytes {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>, StorageError> {
        let mut out = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf_name)?, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            out.push(
                serde_json::from_slice(&value)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?,
            );
        }
        Ok(out)
    }

    /// Upsert a participant into the snapshot (ingest edge).
    pub fn insert_participant(&self, participant: &Participant) -> Result<(), StorageError> {
        debug!(id = %participant.id, "storing participant");
        self.put_json(
            cf_names::PARTICIPANTS,
            participant.id.as_bytes(),
            participant,
        )
    }

    /// Upsert a problem into the snapshot (ingest edge).
    pub fn insert_problem(&self, problem: &Problem) -> Result<(), StorageError> {
        debug!(id = %problem.id, "storing problem");
        self.put_json(cf_names::PROBLEMS, problem.id.as_bytes(), problem)
    }

    /// Point lookup of one participant.
    pub fn get_participant(&self, id: Uuid) -> Result<Option<Participant>, StorageError> {
        self.get_json(cf_names::PARTICIPANTS, id.as_bytes())
    }

    /// Point lookup of one problem.
    pub fn get_problem(&self, id: Uuid) -> Result<Option<Problem>, StorageError> {
        self.get_json(cf_names::PROBLEMS, id.as_bytes())
    }
}

#[async_trait]
impl MatchRepository for RocksDbRepository {
    async fn list_participants(&self) -> MatchResult<Vec<Participant>> {
        let mut list: Vec<Participant> = self.scan_json(cf_names::PARTICIPANTS)?;
        list.sort_by_key(|p| p.id);
        Ok(list)
    }

    async fn list_problems(&self) -> MatchResult<Vec<Problem>> {
        let mut list: Vec<Problem> = self.scan_json(cf_names::PROBLEMS)?;
        list.sort_by_key(|q| q.id);
        Ok(list)
    }

    async fn save_phase1_output(&self, run_id: Uuid, output: &Phase1Output) -> MatchResult<()> {
        let key = run_phase_key(run_id, Phase::Phase1);
        Ok(self.put_json(cf_names::PHASE_OUTPUTS, &key, output)?)
    }

    async fn load_phase1_output(&self, run_id: Uuid) -> MatchResult<Option<Phase1Output>> {
        let key = run_phase_key(run_id, Phase::Phase1);
        Ok(self.get_json(cf_names::PHASE_OUTPUTS, &key)?)
    }

    async fn save_phase2_output(&self, run_id: Uuid, output: &Phase2Output) -> MatchResult<()> {
        let key = run_phase_key(run_id, Phase::Phase2);
        Ok(self.put_json(cf_names::PHASE_OUTPUTS, &key, output)?)
    }

    async fn load_phase2_output(&self, run_id: Uuid) -> MatchResult<Option<Phase2Output>> {
        let key = run_phase_key(run_id, Phase::Phase2);
        Ok(self.get_json(cf_names::PHASE_OUTPUTS, &key)?)
    }

    async fn save_phase3_output(&self, run_id: Uuid, output: &Phase3Output) -> MatchResult<()> {
        let key = run_phase_key(run_id, Phase::Phase3);
        Ok(self.put_json(cf_names::PHASE_OUTPUTS, &key, output)?)
    }

    async fn load_phase3_output(&self, run_id: Uuid) -> MatchResult<Option<Phase3Output>> {
        let key = run_phase_key(run_id, Phase::Phase3);
        Ok(self.get_json(cf_names::PHASE_OUTPUTS, &key)?)
    }

    async fn clear_phase_output(&self, run_id: Uuid, phase: Phase) -> MatchResult<()> {
        let key = run_phase_key(run_id, phase);
        let cf = self.cf(cf_names::PHASE_OUTPUTS)?;
        self.db
            .delete_cf(cf, key)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn save_phase_status(
        &self,
        run_id: Uuid,
        phase: Phase,
        status: &PhaseStatus,
    ) -> MatchResult<()> {
        let key = run_phase_key(run_id, phase);
        Ok(self.put_json(cf_names::PHASE_STATUS, &key, status)?)
    }

    async fn load_phase_status(
        &self,
        run_id: Uuid,
        phase: Phase,
    ) -> MatchResult<Option<PhaseStatus>> {
        let key = run_phase_key(run_id, phase);
        Ok(self.get_json(cf_names::PHASE_STATUS, &key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use teamweaver_core::types::{PhaseState, Role};

    fn sample_participant(i: u32) -> Participant {
        Participant {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, &i.to_le_bytes()),
            full_name: format!("p{i}"),
            email: format!("p{i}@example.com"),
            primary_roles: vec![Role::BackendDev],
            skills: Default::default(),
            availability_hours: 20,
            motivation_embedding: vec![],
            leadership_preference: false,
            ambiguity_comfort: 5,
        }
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let repo = RocksDbRepository::open(tmp.path()).unwrap();

        repo.insert_participant(&sample_participant(1)).unwrap();
        repo.insert_participant(&sample_participant(2)).unwrap();

        let list = repo.list_participants().await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].id < list[1].id);

        let found = repo.get_participant(sample_participant(1).id).unwrap();
        assert_eq!(found.unwrap().full_name, "p1");
    }

    #[tokio::test]
    async fn test_status_roundtrip_and_overwrite() {
        let tmp = TempDir::new().unwrap();
        let repo = RocksDbRepository::open(tmp.path()).unwrap();
        let run = Uuid::new_v4();

        assert!(repo
            .load_phase_status(run, Phase::Phase1)
            .await
            .unwrap()
            .is_none());

        repo.save_phase_status(run, Phase::Phase1, &PhaseStatus::queued())
            .await
            .unwrap();
        let status = repo
            .load_phase_status(run, Phase::Phase1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.state, PhaseState::Queued);

        // Statuses on other phases of the same run are independent.
        assert!(repo
            .load_phase_status(run, Phase::Phase2)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_phase_output_replace_and_clear() {
        let tmp = TempDir::new().unwrap();
        let repo = RocksDbRepository::open(tmp.path()).unwrap();
        let run = Uuid::new_v4();

        let output = Phase2Output {
            teams: vec![],
            unassigned_pool: vec![sample_participant(9).id],
        };
        repo.save_phase2_output(run, &output).await.unwrap();
        let loaded = repo.load_phase2_output(run).await.unwrap().unwrap();
        assert_eq!(loaded, output);

        // Overwrite is idempotent replacement.
        let replacement = Phase2Output {
            teams: vec![],
            unassigned_pool: vec![],
        };
        repo.save_phase2_output(run, &replacement).await.unwrap();
        assert_eq!(
            repo.load_phase2_output(run).await.unwrap().unwrap(),
            replacement
        );

        repo.clear_phase_output(run, Phase::Phase2).await.unwrap();
        assert!(repo.load_phase2_output(run).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reopen_preserves_data() {
        let tmp = TempDir::new().unwrap();
        {
            let repo = RocksDbRepository::open(tmp.path()).unwrap();
            repo.insert_problem(&Problem {
                id: Uuid::new_v5(&Uuid::NAMESPACE_URL, b"q"),
                title: "persisted".into(),
                prompt: "p".into(),
                estimated_team_size: 5,
                role_preferences: Default::default(),
                required_skills: Default::default(),
                ambiguity_level: 5,
                estimated_hours: 20,
                embedding: vec![],
            })
            .unwrap();
        }
        let repo = RocksDbRepository::open(tmp.path()).unwrap();
        let problems = repo.list_problems().await.unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].title, "persisted");
    }
}
