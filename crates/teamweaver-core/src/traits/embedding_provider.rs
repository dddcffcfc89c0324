//! Embedding provider trait for motivation text.
//!
//! The core consumes embeddings as opaque fixed-length real vectors; it
//! never generates them. The dimension is fixed per deployment (commonly
//! 1536). A zero vector is legal and means "missing motivation".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, MatchResult};

/// Result of embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingOutput {
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Model identifier that generated this embedding.
    pub model_id: String,
}

impl EmbeddingOutput {
    /// Create a new output, rejecting empty vectors.
    pub fn new(vector: Vec<f32>, model_id: impl Into<String>) -> MatchResult<Self> {
        if vector.is_empty() {
            return Err(MatchError::InvalidInput {
                field: "embedding".into(),
                reason: "empty vector".into(),
            });
        }
        Ok(Self {
            vector,
            model_id: model_id.into(),
        })
    }

    /// L2 norm of the vector; used to verify normalization.
    pub fn magnitude(&self) -> f32 {
        crate::similarity::l2_norm(&self.vector)
    }
}

/// Trait for embedding generation.
///
/// Implementations must be thread-safe; errors propagate immediately, the
/// core never substitutes fake embeddings for failed generations.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for one text.
    async fn embed(&self, content: &str) -> MatchResult<EmbeddingOutput>;

    /// Output dimension of this provider.
    fn dimensions(&self) -> usize;

    /// Model identifier, for logging and `EmbeddingOutput::model_id`.
    fn model_id(&self) -> &str;
}
