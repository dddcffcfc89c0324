//! Consumed-interface traits.
//!
//! The core stays synchronous inside the kernels; these seams cover the
//! I/O boundaries: snapshot + output persistence, motivation embeddings,
//! and background task dispatch.

mod embedding_provider;
mod repository;
mod task_dispatcher;

pub use embedding_provider::{EmbeddingOutput, EmbeddingProvider};
pub use repository::MatchRepository;
pub use task_dispatcher::{PhaseTask, TaskDispatcher, TaskId};
