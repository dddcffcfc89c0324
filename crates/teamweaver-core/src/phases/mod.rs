//! The three assignment phase kernels.
//!
//! Each kernel is a synchronous pure function from snapshot + config to a
//! serializable output record. The orchestrator owns scheduling,
//! persistence, and status; the kernels own the math.

pub mod kmedoids;
pub mod phase1;
pub mod phase2;
pub mod phase3;

pub use phase1::run_phase1;
pub use phase2::run_phase2;
pub use phase3::run_phase3;
