use serde::Deserialize;
use std::path::Path;

use crate::domain::{DomainError, PromptTemplates};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Everything the server reads at startup: service settings, prompts and page text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub config: Config,
    pub prompts: PromptTemplates,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
    pub server: ServerConfig,
    pub sessions: SessionConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    /// Load only the rows of this query instead of every table.
    pub query: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://your_database.db".to_string(),
            query: None,
            max_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            batch_size: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub chunk_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            chunk_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Least recently used sessions are dropped beyond this many.
    pub max_sessions: usize,
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_timeout_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub caption: String,
    pub placeholder: String,
    /// Markdown shown in the sidebar.
    pub sidebar: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "💬 SQL Data ChatBot".to_string(),
            caption: "🚀 A chatbot powered by OpenAI and retrieval over your database".to_string(),
            placeholder: "Ask me anything about your data".to_string(),
            sidebar: "## How to use\n\
                1. Make sure your SQL database is properly connected\n\
                2. Ask questions about your data in natural language\n\
                3. The bot will analyze your database and provide relevant answers\n\n\
                ## About\n\
                This chatbot uses:\n\
                - Retrieval-Augmented Generation over every table row\n\
                - OpenAI's GPT-3.5 for natural language processing\n\
                - A single-page web interface\n"
                .to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `$CONFIG_PATH` (or `config.yaml` when present), then applies env overrides.
    pub fn load() -> Result<Self, DomainError> {
        let path = std::env::var("CONFIG_PATH").ok();
        let mut config = match path.as_deref() {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(raw).map_err(|e| DomainError::configuration(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<(), DomainError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), DomainError> {
        let cfg = &mut self.config;

        if let Some(url) = lookup("DATABASE_URL") {
            cfg.database.url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            cfg.llm.model = model;
        }
        if let Some(temperature) = lookup("LLM_TEMPERATURE") {
            cfg.llm.temperature = temperature
                .parse()
                .map_err(|_| DomainError::configuration("LLM_TEMPERATURE must be a number"))?;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            cfg.embedding.model = model;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            cfg.server.port = port
                .parse()
                .map_err(|_| DomainError::configuration("SERVER_PORT must be a port number"))?;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            cfg.logging.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                other => {
                    return Err(DomainError::configuration(format!(
                        "unknown LOG_FORMAT {other:?}"
                    )))
                }
            };
        }

        Ok(())
    }

    /// Checks settings that would otherwise only fail on the first request.
    pub fn validate(&self) -> Result<(), DomainError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {}
            _ => return Err(DomainError::configuration(format!("{API_KEY_ENV} is not set"))),
        }
        self.validate_settings()
    }

    fn validate_settings(&self) -> Result<(), DomainError> {
        let cfg = &self.config;
        if cfg.rag.top_k == 0 {
            return Err(DomainError::configuration("rag.top_k must be at least 1"));
        }
        if cfg.rag.chunk_size == 0 {
            return Err(DomainError::configuration("rag.chunk_size must be at least 1"));
        }
        if cfg.embedding.batch_size == 0 {
            return Err(DomainError::configuration(
                "embedding.batch_size must be at least 1",
            ));
        }
        if !(0.0..=2.0).contains(&cfg.llm.temperature) {
            return Err(DomainError::configuration(
                "llm.temperature must be within 0.0..=2.0",
            ));
        }
        if cfg.sessions.max_sessions == 0 {
            return Err(DomainError::configuration(
                "sessions.max_sessions must be at least 1",
            ));
        }
        if cfg.database.max_connections == 0 {
            return Err(DomainError::configuration(
                "database.max_connections must be at least 1",
            ));
        }
        Ok(())
    }
}
