use async_trait::async_trait;

use crate::domain::{errors::DomainError, ChatResponse, Document, Message, VectorIndex};

/// Retrieval-augmented generation capabilities the chat flow depends on.
#[async_trait]
pub trait RagEngine: Send + Sync {
    async fn build_index(&self, documents: &[Document]) -> Result<VectorIndex, DomainError>;

    /// Answers `question` against `index`, folding `history` into the
    /// retrieval query.
    async fn query(
        &self,
        index: &VectorIndex,
        question: &str,
        history: &[Message],
    ) -> Result<ChatResponse, DomainError>;
}
