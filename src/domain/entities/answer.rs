use serde::{Deserialize, Serialize};

use super::SearchResult;

/// Result of one chat round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Question the retrieval actually ran with, after condensing prior turns.
    pub standalone_question: String,
    pub sources: Vec<SearchResult>,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>, standalone_question: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            standalone_question: standalone_question.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<SearchResult>) -> Self {
        self.sources = sources;
        self
    }
}
