//! Language-model providers for commit message generation.

pub mod config;
pub mod ollama;
pub mod openai;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProviderError;

pub use config::{ProviderConfig, provider_timeout, resolve_api_key};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Temperature used for every generation request.
pub(crate) const GENERATION_TEMPERATURE: f32 = 0.3;

/// Generation length cap, in tokens.
pub(crate) const GENERATION_MAX_TOKENS: u32 = 200;

/// A backend that turns a prompt into a commit message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a commit message for `prompt` under `system_prompt`.
    async fn generate_commit_message(
        &self,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<String, ProviderError>;

    /// Display name including the model, e.g. `OpenAI (gpt-3.5-turbo)`.
    fn name(&self) -> String;

    /// Check credentials without generating anything.
    async fn validate_api_key(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProviderKind {
    #[default]
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "ollama")]
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Ollama => "Ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construct the provider selected by `config.kind`.
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn AiProvider>, ProviderError> {
    match config.kind {
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::with_timeout(
                config.api_key.as_deref(),
                config.model.as_deref(),
                config.timeout,
            )?;
            if let Some(base_url) = config.openai_base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            Ok(Box::new(provider))
        }
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::with_timeout(
            config.model.as_deref(),
            config.ollama_url.as_deref(),
            config.timeout,
        )?)),
    }
}

pub(crate) fn http_client(
    provider: &'static str,
    timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ProviderError::Request { provider, source })
}

/// Map a transport failure onto the provider error taxonomy.
pub(crate) fn transport_error(
    provider: &'static str,
    timeout: Duration,
    source: reqwest::Error,
) -> ProviderError {
    if source.is_timeout() {
        ProviderError::Timeout {
            provider,
            secs: timeout.as_secs(),
        }
    } else {
        ProviderError::Request { provider, source }
    }
}
