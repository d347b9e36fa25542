//! Hosted LLM providers.
//!
//! Mistral and Perplexity both expose an OpenAI-compatible
//! `/chat/completions` endpoint, so one client type serves both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{LunaBugConfig, MISTRAL_ENDPOINT, PERPLEXITY_ENDPOINT};
use crate::prompts::{ChatMessage, Mode};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network, TLS, timeout or body decoding failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Provider returned no completion")]
    EmptyCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub model: String,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, mode: Mode, messages: &[ChatMessage]) -> Result<Completion, ProviderError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatibleProvider {
    name: String,
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    /// Key used for [`Mode::Debug`] requests, if different.
    debug_api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            debug_api_key: None,
        }
    }

    pub fn with_debug_key(mut self, key: Option<String>) -> Self {
        self.debug_api_key = key;
        self
    }

    /// Mistral, if `MISTRAL_API_KEY` is configured.
    pub fn mistral(config: &LunaBugConfig, client: reqwest::Client) -> Option<Self> {
        let key = config.mistral_api_key.clone()?;
        Some(
            Self::new("mistral", client, MISTRAL_ENDPOINT, config.mistral_model.clone(), key)
                .with_debug_key(config.mistral_debug_api_key.clone()),
        )
    }

    /// Perplexity, if `PERPLEXITY_API_KEY` is configured.
    pub fn perplexity(config: &LunaBugConfig, client: reqwest::Client) -> Option<Self> {
        let key = config.perplexity_api_key.clone()?;
        Some(Self::new(
            "perplexity",
            client,
            PERPLEXITY_ENDPOINT,
            config.perplexity_model.clone(),
            key,
        ))
    }

    fn key_for(&self, mode: Mode) -> &str {
        match (mode, self.debug_api_key.as_deref()) {
            (Mode::Debug, Some(key)) => key,
            _ => &self.api_key,
        }
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, mode: Mode, messages: &[ChatMessage]) -> Result<Completion, ProviderError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            temperature: if mode == Mode::Debug { 0.2 } else { 0.7 },
            max_tokens: 1024,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.key_for(mode))
            .json(&body)
            .send()
            .await?;
        let parsed: CompletionResponse = Self::ensure_success(response).await?.json().await?;

        let content = parsed
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ProviderError::EmptyCompletion)?;

        Ok(Completion {
            content,
            model: parsed.model.unwrap_or_else(|| self.model.clone()),
        })
    }
}
