use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::LlmConfig;

pub struct OpenAiLlm {
    model: String,
    temperature: f64,
}

impl OpenAiLlm {
    pub fn new(model: impl Into<String>, temperature: f64) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(&config.model, config.temperature)
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let client = openai::Client::from_env();
        let agent = client
            .agent(&self.model)
            .temperature(self.temperature)
            .build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::external(e.to_string()))
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        let client = openai::Client::from_env();
        let agent = client
            .agent(&self.model)
            .preamble(system)
            .temperature(self.temperature)
            .build();
        agent
            .prompt(prompt)
            .await
            .map_err(|e| DomainError::external(e.to_string()))
    }
}
