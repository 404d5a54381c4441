//! OpenRouter chat-completions client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::OpenRouterConfig;
use crate::orchestrator::cost::TokenUsage;
use crate::types::Message;

/// Configuration for an OpenAI-compatible API provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL for the API (e.g., "https://openrouter.ai/api/v1")
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Extra headers to include in requests (HTTP-Referer, X-Title)
    pub extra_headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Create an OpenRouter provider configuration
    pub fn openrouter(api_key: String, config: &OpenRouterConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            extra_headers: vec![
                ("HTTP-Referer".to_string(), config.referer.clone()),
                ("X-Title".to_string(), config.title.clone()),
            ],
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Failure talking to the completion provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Provider answered with a non-success status
    #[error("LLM API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to reach LLM provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse LLM response: {0}")]
    Decode(String),
}

/// One chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Provider-side model id (the OpenRouter id)
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
}

/// Provider answer, reduced to what callers use
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    /// Model the provider reports having used
    pub model: Option<String>,
    pub usage: TokenUsage,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// OpenRouter API client
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Arc<Client>,
    provider: ProviderConfig,
}

impl OpenRouterClient {
    /// Create a client with a specific provider configuration
    pub fn with_provider(provider: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(provider.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client: Arc::new(client),
            provider,
        })
    }

    /// Create client from config, reading the API key from env or keyring
    pub fn from_config(config: &OpenRouterConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => crate::security::keyring::get_api_key()?,
        };
        Self::with_provider(ProviderConfig::openrouter(api_key, config))
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let body = ChatRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_openai_string(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            max_tokens: request.max_tokens,
        };

        debug!("Sending {} messages to {}", body.messages.len(), request.model);

        let mut req_builder = self
            .client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .bearer_auth(&self.provider.api_key);
        for (key, value) in &self.provider.extra_headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }
        let response = req_builder.json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let text = response.text().await?;
        parse_completion(&text)
    }
}

/// Extract content, model and usage from a chat-completions body
///
/// Content may be a string or an array of `{type: "text", text}` parts.
/// Missing fields default to empty / zero.
pub fn parse_completion(body: &str) -> Result<Completion, ProviderError> {
    let raw: Value = serde_json::from_str(body).map_err(|e| {
        ProviderError::Decode(format!("{} (body: {})", e, crate::truncate_safe(body, 500)))
    })?;

    let content_value = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"));

    let content = match content_value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    };

    let usage = raw.get("usage");
    let tokens = |field: &str| {
        usage
            .and_then(|u| u.get(field))
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    };

    Ok(Completion {
        content,
        model: raw.get("model").and_then(|m| m.as_str()).map(str::to_string),
        usage: TokenUsage {
            input: tokens("prompt_tokens"),
            output: tokens("completion_tokens"),
        },
    })
}
