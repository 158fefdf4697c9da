use std::sync::{Arc, Mutex};
use tracing::instrument;

use crate::domain::{ports::RagEngine, ChatResponse, DomainError, Message, VectorIndex};

/// Chat façade over one index. Keeps the prior turns it condenses follow-up
/// questions with.
pub struct ChatEngine {
    rag: Arc<dyn RagEngine>,
    index: Arc<VectorIndex>,
    memory: Mutex<Vec<Message>>,
}

impl ChatEngine {
    pub fn new(rag: Arc<dyn RagEngine>, index: Arc<VectorIndex>) -> Self {
        Self {
            rag,
            index,
            memory: Mutex::new(Vec::new()),
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Memory only grows on success; a failed call leaves it untouched.
    #[instrument(skip(self, message), fields(index_id = %self.index.id()))]
    pub async fn chat(&self, message: &str) -> Result<ChatResponse, DomainError> {
        let history = self.memory()?;
        let response = self.rag.query(&self.index, message, &history).await?;

        let mut memory = self
            .memory
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        memory.push(Message::user(message));
        memory.push(Message::assistant(response.response.as_str()));

        Ok(response)
    }

    pub fn memory(&self) -> Result<Vec<Message>, DomainError> {
        self.memory
            .lock()
            .map(|m| m.clone())
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    pub fn reset(&self) -> Result<(), DomainError> {
        self.memory
            .lock()
            .map(|mut m| m.clear())
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}
