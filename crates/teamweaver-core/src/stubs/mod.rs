//! Stub implementations of the consumed interfaces.
//!
//! In-memory repository and hash-seeded embeddings for tests and local
//! runs; an in-process dispatcher that executes phase tasks on the
//! current tokio runtime. Deployment swaps these for the RocksDB
//! repository and an external queue without touching the core.

mod inline_dispatcher;
mod inmemory_repository;
mod stub_embedding_provider;

pub use inline_dispatcher::InlineDispatcher;
pub use inmemory_repository::InMemoryRepository;
pub use stub_embedding_provider::StubEmbeddingProvider;
