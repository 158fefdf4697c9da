//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! adapters, so the whole chat flow runs against fakes in tests.

pub mod services;

pub use services::{ChatEngine, ChatService, ChatSession, IndexLoader, RagService, SessionStore};
