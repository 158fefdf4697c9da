mod database;
mod embedding;
mod llm;
mod rag;

pub use database::DatabaseReader;
pub use embedding::EmbeddingService;
pub use llm::LlmService;
pub use rag::RagEngine;
