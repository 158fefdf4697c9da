use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel;
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// OpenAI text embeddings; the key comes from `OPENAI_API_KEY`.
pub struct TextEmbedding {
    model: String,
    batch_size: usize,
}

impl TextEmbedding {
    pub fn new() -> Self {
        Self::from_config(&EmbeddingConfig::default())
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for TextEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let client = openai::Client::from_env();
        let model = client.embedding_model(&self.model);

        let embedding = model
            .embed_text(text)
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        Ok(Embedding::from_f64(&embedding.vec))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let client = openai::Client::from_env();
        let model = client.embedding_model(&self.model);
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            let vectors = model
                .embed_texts(batch.to_vec())
                .await
                .map_err(|e| DomainError::external(e.to_string()))?;

            if vectors.len() != batch.len() {
                return Err(DomainError::external(format!(
                    "embedding batch {batch_no} returned {} vectors for {} inputs",
                    vectors.len(),
                    batch.len()
                )));
            }

            tracing::debug!(batch = batch_no, size = batch.len(), "embedding batch done");
            embeddings.extend(vectors.iter().map(|e| Embedding::from_f64(&e.vec)));
        }

        Ok(embeddings)
    }
}
