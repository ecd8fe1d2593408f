//! Ollama chat provider.
//!
//! Every generation first lists the local models via `/api/tags`, so an
//! unreachable server or a model that was never pulled fails with an
//! actionable message instead of a raw HTTP error.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::llm::config::DEFAULT_TIMEOUT;
use crate::llm::{
    AiProvider, GENERATION_MAX_TOKENS, GENERATION_TEMPERATURE, http_client, transport_error,
};

pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const PROVIDER: &str = "Ollama";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

pub struct OllamaProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(model: Option<&str>, base_url: Option<&str>) -> Result<Self, ProviderError> {
        Self::with_timeout(model, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        model: Option<&str>,
        base_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            model: model.unwrap_or(DEFAULT_OLLAMA_MODEL).to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Confirm the server is up and has the configured model.
    async fn check_model_available(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::ConnectionRefused {
                        url: self.base_url.clone(),
                    }
                } else {
                    transport_error(PROVIDER, self.timeout, e)
                }
            })?;

        if !response.status().is_success() {
            return Err(response_error(response).await);
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        debug!("Ollama reports {} local model(s)", tags.models.len());

        if tags.models.iter().any(|m| model_matches(&self.model, &m.name)) {
            Ok(())
        } else {
            Err(ProviderError::ModelNotFound {
                model: self.model.clone(),
            })
        }
    }
}

/// Whether a listed model name satisfies the requested one.
///
/// An untagged request matches its `:latest` variant; a tagged request must
/// match exactly.
fn model_matches(requested: &str, listed: &str) -> bool {
    if requested == listed {
        return true;
    }
    !requested.contains(':') && listed.strip_suffix(":latest") == Some(requested)
}

async fn response_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ProviderError::ProviderResponseError {
        provider: PROVIDER,
        status,
        body,
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    async fn generate_commit_message(
        &self,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<String, ProviderError> {
        self.check_model_available().await?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: GENERATION_TEMPERATURE,
                num_predict: GENERATION_MAX_TOKENS,
            },
        };

        debug!("POST {}/api/chat (model {})", self.base_url, self.model);
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        if !response.status().is_success() {
            return Err(response_error(response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        body.message
            .map(|m| m.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::EmptyGeneration)
    }

    fn name(&self) -> String {
        format!("{} ({})", PROVIDER, self.model)
    }
}
