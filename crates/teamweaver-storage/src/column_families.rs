//! Column family definitions for the matchmaking store.
//!
//! # Column Families (4 total)
//!
//! | Name | Purpose | Key Format | Value |
//! |------|---------|------------|-------|
//! | participants | Participant snapshot | uuid (16 bytes) | Participant JSON |
//! | problems | Problem snapshot | uuid (16 bytes) | Problem JSON |
//! | phase_outputs | Per-phase results | run uuid (16) + phase tag (1) | output JSON |
//! | phase_status | Per-phase status records | run uuid (16) + phase tag (1) | PhaseStatus JSON |

use rocksdb::{ColumnFamilyDescriptor, Options};
use uuid::Uuid;

use teamweaver_core::types::Phase;

/// Column family name constants.
pub mod cf_names {
    /// Participant snapshot documents.
    pub const PARTICIPANTS: &str = "participants";
    /// Problem snapshot documents.
    pub const PROBLEMS: &str = "problems";
    /// Phase output documents, keyed by run and phase.
    pub const PHASE_OUTPUTS: &str = "phase_outputs";
    /// Phase status records, keyed by run and phase.
    pub const PHASE_STATUS: &str = "phase_status";

    /// All column families, in open order.
    pub const ALL: &[&str] = &[PARTICIPANTS, PROBLEMS, PHASE_OUTPUTS, PHASE_STATUS];
}

/// Descriptors for every column family, with default options.
///
/// Values are small JSON documents; no special table tuning is needed at
/// matchmaking scale.
pub fn column_family_descriptors() -> Vec<ColumnFamilyDescriptor> {
    cf_names::ALL
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
        .collect()
}

/// Single byte identifying a phase inside composite keys.
pub(crate) fn phase_tag(phase: Phase) -> u8 {
    match phase {
        Phase::Phase1 => 1,
        Phase::Phase2 => 2,
        Phase::Phase3 => 3,
    }
}

/// Composite key for per-(run, phase) records: 16-byte run id + tag.
pub(crate) fn run_phase_key(run_id: Uuid, phase: Phase) -> [u8; 17] {
    let mut key = [0u8; 17];
    key[..16].copy_from_slice(run_id.as_bytes());
    key[16] = phase_tag(phase);
    key
}
