use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    chunk_document, history_to_string,
    ports::{EmbeddingService, LlmService, RagEngine},
    ChatResponse, Document, DomainError, Message, PromptTemplates, SearchResult, VectorIndex,
};

/// Condense-question retrieval over a [`VectorIndex`], backed by an embedding
/// model and an LLM.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    llm: Arc<dyn LlmService>,
    prompts: PromptTemplates,
    top_k: usize,
    chunk_size: usize,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        llm: Arc<dyn LlmService>,
        prompts: PromptTemplates,
        top_k: usize,
        chunk_size: usize,
    ) -> Self {
        Self {
            embedding,
            llm,
            prompts,
            top_k,
            chunk_size,
        }
    }

    /// Rewrites a follow-up into a standalone question. Without prior turns the
    /// question is already standalone and no LLM call is made.
    #[instrument(skip(self, history), fields(turns = history.len()))]
    pub async fn condense_question(
        &self,
        question: &str,
        history: &[Message],
    ) -> Result<String, DomainError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = self
            .prompts
            .render_condense(&history_to_string(history), question);
        let condensed = self.llm.complete(&prompt).await?;
        let condensed = condensed.trim();

        if condensed.is_empty() {
            tracing::warn!("empty condensed question, keeping the follow-up as asked");
            return Ok(question.to_string());
        }

        tracing::debug!(standalone = %condensed, "question condensed");
        Ok(condensed.to_string())
    }

    #[instrument(skip(self, index), fields(index_id = %index.id()))]
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        Ok(index.search(&embedding, self.top_k))
    }

    async fn synthesize(
        &self,
        question: &str,
        sources: &[SearchResult],
    ) -> Result<String, DomainError> {
        let context = sources
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = self.prompts.render_text_qa(&context, question);
        let answer = self
            .llm
            .complete_with_system(&self.prompts.qa_system, &prompt)
            .await?;

        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl RagEngine for RagService {
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    async fn build_index(&self, documents: &[Document]) -> Result<VectorIndex, DomainError> {
        let chunks: Vec<_> = documents
            .iter()
            .flat_map(|doc| chunk_document(doc, self.chunk_size))
            .collect();

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::external(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let index = VectorIndex::new(chunks.into_iter().zip(embeddings).collect(), documents.len());
        tracing::info!(index_id = %index.id(), chunks = index.len(), "index built");
        Ok(index)
    }

    #[instrument(skip(self, index, history), fields(turns = history.len()))]
    async fn query(
        &self,
        index: &VectorIndex,
        question: &str,
        history: &[Message],
    ) -> Result<ChatResponse, DomainError> {
        let standalone = self.condense_question(question, history).await?;
        let sources = self.retrieve(index, &standalone).await?;

        if sources.is_empty() {
            return Ok(ChatResponse::new(
                self.prompts.empty_response.clone(),
                standalone,
            ));
        }

        let answer = self.synthesize(&standalone, &sources).await?;
        Ok(ChatResponse::new(answer, standalone).with_sources(sources))
    }
}
