//! OpenAI-compatible chat completions backend.
//!
//! Also works against gateways that speak the same protocol (OpenRouter,
//! local inference servers) via `with_base_url`.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{CompletionRequest, LanguageModel, LlmError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiModel {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    label: String,
}

impl OpenAiModel {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {e}")))?;
        let model = model.into();
        Ok(Self {
            http,
            api_key: api_key.into(),
            label: format!("openai:{model}"),
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl LanguageModel for OpenAiModel {
    fn name(&self) -> &str {
        &self.label
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let start = Instant::now();
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(LlmError::from_status(status, text));
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| LlmError::Parse(format!("chat response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("no choices in response".into()))?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "chat completion"
        );
        Ok(content)
    }
}
