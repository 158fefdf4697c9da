use std::sync::Arc;
use std::time::Duration;

use crate::application::{ChatService, IndexLoader, RagService, SessionStore};
use crate::domain::DomainError;
use crate::infrastructure::{AppConfig, OpenAiLlm, SqliteDatabaseReader, TextEmbedding};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub sessions: SessionStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(chat: Arc<ChatService>, config: AppConfig) -> Self {
        let limits = &config.config.sessions;
        let sessions = SessionStore::new(
            limits.max_sessions,
            Duration::from_secs(limits.idle_timeout_secs),
        );
        Self {
            chat,
            sessions,
            config: Arc::new(config),
        }
    }

    /// Wires the SQLite reader and the OpenAI-backed RAG service. Nothing is
    /// contacted until the first page load.
    pub fn from_config(config: AppConfig) -> Result<Self, DomainError> {
        let cfg = &config.config;
        let reader = Arc::new(SqliteDatabaseReader::lazy(&cfg.database)?);
        let rag = Arc::new(RagService::new(
            Arc::new(TextEmbedding::from_config(&cfg.embedding)),
            Arc::new(OpenAiLlm::from_config(&cfg.llm)),
            config.prompts.clone(),
            cfg.rag.top_k,
            cfg.rag.chunk_size,
        ));
        let loader = Arc::new(IndexLoader::new(reader, rag.clone()));
        let chat = Arc::new(ChatService::new(loader, rag));

        Ok(Self::new(chat, config))
    }
}
