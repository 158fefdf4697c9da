use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;
    /// Embeds `texts` in order; the result has one embedding per input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError>;
}
