use std::time::Duration;

use tracing::warn;

use super::{CompletionRequest, LanguageModel, LlmError};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Wraps a model and retries transient failures.
///
/// Non-transient errors (auth, bad request, unparseable envelope) return
/// immediately; after the last attempt the final error is surfaced as-is.
pub struct RetryingModel {
    inner: Box<dyn LanguageModel>,
    policy: RetryPolicy,
}

impl RetryingModel {
    pub fn new(inner: Box<dyn LanguageModel>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl LanguageModel for RetryingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut attempt = 1;
        loop {
            match self.inner.complete(request) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(
                        model = self.inner.name(),
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "language model call failed; retrying"
                    );
                    std::thread::sleep(self.policy.backoff);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
