//! LLM completion provider trait and the OpenAI-compatible adapter.
//!
//! Providers implement [`CompletionProvider`] and self-report which model
//! identifiers they can serve; adding a backend family means adding an
//! implementation, not extending a lookup table.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{HuginnError, Result};

/// Default base URL for the OpenAI-compatible completions API.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider of single-prompt LLM completions.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Whether this provider serves the given model identifier.
    fn supports(&self, model: &str) -> bool;

    /// Complete `prompt` with `model`, returning the response text.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Adapter for OpenAI-compatible chat completion endpoints (OpenAI, Azure
/// deployments, self-hosted gateways speaking the same wire format).
#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: String,
    http: Client,
    base_url: String,
    models: Vec<String>,
}

impl OpenAiProvider {
    /// Create a provider against the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a provider with a custom base URL (Azure-style deployments,
    /// or wiremock in tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into(),
            models: vec!["gpt-4o".to_string()],
        }
    }

    /// Replace the served model list.
    pub fn models(mut self, models: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn supports(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&CompletionRequest {
                model,
                messages: vec![RequestMessage {
                    role: "user",
                    content: prompt.trim(),
                }],
                temperature: 0.0,
            })
            .send()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HuginnError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| HuginnError::Http(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(HuginnError::Extraction("completion had no message content"))
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
