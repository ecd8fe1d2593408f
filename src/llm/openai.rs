//! OpenAI chat completions provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::llm::config::DEFAULT_TIMEOUT;
use crate::llm::{
    AiProvider, GENERATION_MAX_TOKENS, GENERATION_TEMPERATURE, http_client, transport_error,
};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Fails with [`ProviderError::MissingApiKey`] when the key is absent or blank.
    pub fn new(api_key: Option<&str>, model: Option<&str>) -> Result<Self, ProviderError> {
        Self::with_timeout(api_key, model, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: Option<&str>,
        model: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::MissingApiKey)?;

        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            api_key: api_key.to_string(),
            model: model.unwrap_or(DEFAULT_OPENAI_MODEL).to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout,
        })
    }

    /// Point the provider at another API root, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn error_for_status(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return ProviderError::InvalidCredentials { provider: PROVIDER };
        }
        let body = response.text().await.unwrap_or_default();
        ProviderError::ProviderResponseError {
            provider: PROVIDER,
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    async fn generate_commit_message(
        &self,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<String, ProviderError> {
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
            temperature: GENERATION_TEMPERATURE,
            max_tokens: GENERATION_MAX_TOKENS,
        };

        debug!("POST {}/chat/completions (model {})", self.base_url, self.model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ProviderError::EmptyGeneration)
    }

    fn name(&self) -> String {
        format!("{} ({})", PROVIDER, self.model)
    }

    async fn validate_api_key(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout, e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for_status(response).await)
        }
    }
}
