//! Error types for teamweaver-core.
//!
//! One unified [`MatchError`] covers the whole failure taxonomy. Every kind
//! is explicit and distinguishable so the orchestrator can translate
//! component failures into phase status transitions without string
//! matching.
//!
//! # Propagation policy
//!
//! - Numerical kernels never panic; they return structured results.
//! - Transient repository errors ([`MatchError::StorageUnavailable`]) are
//!   retried with exponential backoff by the orchestrator; everything else
//!   surfaces immediately.
//! - The orchestrator is the single point that converts a `MatchError`
//!   into a failed phase status.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::Phase;

/// Result alias used throughout the crate.
pub type MatchResult<T> = Result<T, MatchError>;

/// Unified error for all matchmaking operations.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Schema violation, weights not summing to 1, unknown role,
    /// non-finite number. Surfaced to the caller; the run is not started.
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput {
        /// Offending field or parameter.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Too few participants or problems to satisfy the target team size.
    /// The run starts but the phase fails with this code.
    #[error("Insufficient data: need {needed}, have {available}: {context}")]
    InsufficientData {
        /// Minimum count required.
        needed: usize,
        /// Count actually available.
        available: usize,
        /// What was being counted.
        context: String,
    },

    /// Cost matrix contains a negative or non-finite entry.
    ///
    /// This indicates an internal bug in matrix construction and is fatal
    /// for the phase.
    #[error("Invalid cost at ({row}, {col}): {value}")]
    InvalidCost {
        /// Matrix row of the offending entry.
        row: usize,
        /// Matrix column of the offending entry.
        col: usize,
        /// The rejected value.
        value: f64,
    },

    /// Attempt to start a phase that is already queued or running.
    #[error("Phase {0} is already in progress")]
    PhaseBusy(Phase),

    /// Attempt to start phase N while phase N-1 is not completed.
    #[error("Phase {phase} requires {upstream} to be completed (currently {upstream_state})")]
    PhasePreconditionUnmet {
        /// The phase that was requested.
        phase: Phase,
        /// Its upstream dependency.
        upstream: Phase,
        /// The upstream phase's current state, rendered for diagnostics.
        upstream_state: String,
    },

    /// Cooperative cancellation observed between solver iterations.
    #[error("Canceled")]
    Canceled,

    /// Wall-clock budget exhausted; behaves identically to cancel.
    #[error("Timeout")]
    Timeout,

    /// Transient repository error. Retried with exponential backoff up to
    /// a bounded attempt count; after exhaustion the phase fails.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl MatchError {
    /// Classify this error for status records.
    pub fn kind(&self) -> PhaseErrorKind {
        match self {
            Self::InvalidInput { .. } => PhaseErrorKind::InvalidInput,
            Self::InsufficientData { .. } => PhaseErrorKind::InsufficientData,
            Self::InvalidCost { .. } => PhaseErrorKind::InvalidCost,
            Self::PhaseBusy(_) => PhaseErrorKind::PhaseBusy,
            Self::PhasePreconditionUnmet { .. } => PhaseErrorKind::PhasePreconditionUnmet,
            Self::Canceled => PhaseErrorKind::Canceled,
            Self::Timeout => PhaseErrorKind::Timeout,
            Self::StorageUnavailable(_) => PhaseErrorKind::StorageUnavailable,
        }
    }

    /// Whether the orchestrator may retry the failed operation.
    ///
    /// Only transient storage failures qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

/// Serializable error classification carried in phase status records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseErrorKind {
    InvalidInput,
    InsufficientData,
    InvalidCost,
    PhaseBusy,
    PhasePreconditionUnmet,
    Canceled,
    Timeout,
    StorageUnavailable,
}

impl std::fmt::Display for PhaseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidInput => "invalid_input",
            Self::InsufficientData => "insufficient_data",
            Self::InvalidCost => "invalid_cost",
            Self::PhaseBusy => "phase_busy",
            Self::PhasePreconditionUnmet => "phase_precondition_unmet",
            Self::Canceled => "canceled",
            Self::Timeout => "timeout",
            Self::StorageUnavailable => "storage_unavailable",
        };
        write!(f, "{s}")
    }
}

/// Failure payload persisted in a phase status record.
///
/// Always well-typed: kind + message + optional diagnostic counts
/// (e.g. number of unassigned participants).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseFailure {
    /// Classified error kind.
    pub kind: PhaseErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Diagnostic counters keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub diagnostics: BTreeMap<String, u64>,
}

impl PhaseFailure {
    /// Build a failure record from an error.
    pub fn from_error(err: &MatchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            diagnostics: BTreeMap::new(),
        }
    }

    /// Attach a diagnostic counter.
    pub fn with_diagnostic(mut self, key: impl Into<String>, value: u64) -> Self {
        self.diagnostics.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification_is_total() {
        let cases: Vec<(MatchError, PhaseErrorKind)> = vec![
            (
                MatchError::InvalidInput {
                    field: "weights".into(),
                    reason: "sum 0.9".into(),
                },
                PhaseErrorKind::InvalidInput,
            ),
            (
                MatchError::InsufficientData {
                    needed: 5,
                    available: 3,
                    context: "participants".into(),
                },
                PhaseErrorKind::InsufficientData,
            ),
            (
                MatchError::InvalidCost {
                    row: 0,
                    col: 1,
                    value: f64::NAN,
                },
                PhaseErrorKind::InvalidCost,
            ),
            (MatchError::PhaseBusy(Phase::Phase1), PhaseErrorKind::PhaseBusy),
            (MatchError::Canceled, PhaseErrorKind::Canceled),
            (MatchError::Timeout, PhaseErrorKind::Timeout),
            (
                MatchError::StorageUnavailable("io".into()),
                PhaseErrorKind::StorageUnavailable,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "wrong kind for {err}");
        }
    }

    #[test]
    fn test_only_storage_errors_are_transient() {
        assert!(MatchError::StorageUnavailable("blip".into()).is_transient());
        assert!(!MatchError::Canceled.is_transient());
        assert!(!MatchError::Timeout.is_transient());
        assert!(!MatchError::InvalidCost {
            row: 0,
            col: 0,
            value: -1.0
        }
        .is_transient());
    }

    #[test]
    fn test_failure_roundtrip() {
        let failure = PhaseFailure::from_error(&MatchError::InsufficientData {
            needed: 10,
            available: 4,
            context: "participants".into(),
        })
        .with_diagnostic("unassigned_participants", 4);

        let json = serde_json::to_string(&failure).unwrap();
        let back: PhaseFailure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, failure);
        assert_eq!(back.diagnostics["unassigned_participants"], 4);
    }
}
