pub mod config;
pub mod database;
pub mod embedding;
pub mod llm;
pub mod logging;

pub use config::{AppConfig, Config, UiConfig};
pub use database::SqliteDatabaseReader;
pub use embedding::TextEmbedding;
pub use llm::OpenAiLlm;
