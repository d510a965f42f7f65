//! Language-model collaborator.
//!
//! The `LanguageModel` trait abstracts over providers (Anthropic Messages API,
//! OpenAI-compatible chat completions) so the AI analyzer can be tested with
//! scripted models. Calls are blocking; `RetryingModel` adds the bounded retry
//! policy for transient failures.

pub mod anthropic;
pub mod openai;
pub mod retry;

pub use anthropic::AnthropicModel;
pub use openai::OpenAiModel;
pub use retry::{RetryPolicy, RetryingModel};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::Credentials;

/// One prompt/response exchange with sampling limits.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Structured errors from model calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model not configured: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Parse(String),
}

impl LlmError {
    /// Worth another attempt: network trouble, rate limits, server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::RateLimited(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Config(_) | LlmError::Parse(_) => false,
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            LlmError::RateLimited(body)
        } else {
            LlmError::Api {
                status: status.as_u16(),
                message: body,
            }
        }
    }
}

/// Trait for language-model backends.
pub trait LanguageModel: Send + Sync {
    /// Human-readable name (e.g., "anthropic:claude-3-5-haiku-latest").
    fn name(&self) -> &str;

    /// Send one request and return the raw text of the reply.
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Which API the model is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    Anthropic,
    /// OpenAI or any gateway speaking the chat-completions protocol.
    Openai,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Anthropic => "claude-3-5-haiku-latest",
            LlmProvider::Openai => "gpt-4o-mini",
        }
    }
}

/// Connection settings for the language model (`[llm]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            model: None,
            base_url: None,
            timeout_secs: 60,
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl LlmSettings {
    pub fn resolved_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Build the configured model, wrapped in the retry policy.
///
/// Returns `Ok(None)` when no API key is available for the provider; the AI
/// analyzer then runs in statistical-only mode.
pub fn build_language_model(
    settings: &LlmSettings,
    credentials: &Credentials,
) -> Result<Option<Box<dyn LanguageModel>>, LlmError> {
    let timeout = Duration::from_secs(settings.timeout_secs);
    let model = settings.resolved_model();

    let inner: Box<dyn LanguageModel> = match settings.provider {
        LlmProvider::Anthropic => {
            let Some(key) = credentials.anthropic_api_key.as_deref() else {
                tracing::info!("ANTHROPIC_API_KEY not set; AI pricing unavailable");
                return Ok(None);
            };
            let mut m = AnthropicModel::new(key, model, timeout)?;
            if let Some(url) = &settings.base_url {
                m = m.with_base_url(url);
            }
            Box::new(m)
        }
        LlmProvider::Openai => {
            let Some(key) = credentials.openai_api_key.as_deref() else {
                tracing::info!("OPENAI_API_KEY not set; AI pricing unavailable");
                return Ok(None);
            };
            let mut m = OpenAiModel::new(key, model, timeout)?;
            if let Some(url) = &settings.base_url {
                m = m.with_base_url(url);
            }
            Box::new(m)
        }
    };

    Ok(Some(Box::new(RetryingModel::new(
        inner,
        settings.retry_policy(),
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(LlmError::Network("reset".into()).is_transient());
        assert!(LlmError::RateLimited("slow down".into()).is_transient());
        assert!(LlmError::Api {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!LlmError::Api {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!LlmError::Parse("bad json".into()).is_transient());
    }

    #[test]
    fn status_429_is_rate_limited() {
        let err = LlmError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "busy".into());
        assert!(matches!(err, LlmError::RateLimited(_)));
    }

    #[test]
    fn default_settings() {
        let s = LlmSettings::default();
        assert_eq!(s.max_attempts, 3);
        assert_eq!(s.resolved_model(), "claude-3-5-haiku-latest");
        assert_eq!(s.retry_policy().backoff, Duration::from_millis(500));
    }

    #[test]
    fn missing_key_means_no_model() {
        let creds = Credentials::default();
        let model = build_language_model(&LlmSettings::default(), &creds).unwrap();
        assert!(model.is_none());
    }

    #[test]
    fn provider_parses_from_toml() {
        let s: LlmSettings = toml::from_str("provider = \"openai\"\nmodel = \"gpt-4o\"").unwrap();
        assert_eq!(s.provider, LlmProvider::Openai);
        assert_eq!(s.resolved_model(), "gpt-4o");
        assert_eq!(s.max_attempts, 3);
    }
}
