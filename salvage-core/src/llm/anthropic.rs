//! Anthropic Messages API backend.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{CompletionRequest, LanguageModel, LlmError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

pub struct AnthropicModel {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    label: String,
}

impl AnthropicModel {
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
            label: format!("anthropic:{model}"),
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point at a proxy or a local stub server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl LanguageModel for AnthropicModel {
    fn name(&self) -> &str {
        &self.label
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let start = Instant::now();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(LlmError::from_status(status, text));
        }

        let parsed: MessagesResponse = resp
            .json()
            .map_err(|e| LlmError::Parse(format!("messages response: {e}")))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect();
        if text.is_empty() {
            return Err(LlmError::Parse("response has no text content".into()));
        }

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "anthropic completion"
        );
        Ok(text)
    }
}
