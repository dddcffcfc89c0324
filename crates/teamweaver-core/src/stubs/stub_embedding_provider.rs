//! Deterministic stub embedding provider.
//!
//! # TEST / LOCAL ONLY
//!
//! Produces hash-seeded pseudo-random unit vectors: the same text always
//! maps to the same embedding, different texts land far apart with high
//! probability. No model, no I/O.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::constants::DEFAULT_EMBEDDING_DIM;
use crate::error::MatchResult;
use crate::similarity;
use crate::traits::{EmbeddingOutput, EmbeddingProvider};

const MODEL_ID: &str = "stub-embedding-v1";

/// Hash-seeded embedding stub.
#[derive(Debug, Clone)]
pub struct StubEmbeddingProvider {
    dimensions: usize,
}

impl StubEmbeddingProvider {
    /// Stub at the default deployment dimension (1536).
    pub fn new() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIM,
        }
    }

    /// Stub at an explicit dimension (small dimensions keep tests cheap).
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed(&self, content: &str) -> MatchResult<EmbeddingOutput> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        content.hash(&mut hasher);
        let mut rng = ChaCha8Rng::seed_from_u64(hasher.finish());

        let mut vector: Vec<f32> =
            (0..self.dimensions).map(|_| rng.gen_range(-1.0..1.0)).collect();
        similarity::normalize(&mut vector);
        EmbeddingOutput::new(vector, MODEL_ID)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        MODEL_ID
    }
}
