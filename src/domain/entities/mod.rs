mod answer;
mod conversation;
mod document;
mod embedding;
mod index;
mod prompt;

pub use answer::ChatResponse;
pub use conversation::{history_to_string, Conversation, Message, MessageRole};
pub use document::{chunk_document, Document, DocumentChunk, DocumentSource, SearchResult};
pub use embedding::Embedding;
pub use index::{IndexStats, VectorIndex};
pub use prompt::PromptTemplates;
