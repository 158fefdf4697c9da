mod chat;
mod loader;
mod rag;
mod session;

pub use chat::ChatEngine;
pub use loader::IndexLoader;
pub use rag::RagService;
pub use session::{ChatService, ChatSession, SessionStore};
