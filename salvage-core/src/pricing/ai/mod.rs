//! Model-backed pricing with statistical fallback.
//!
//! The model sees the raw listings (not the cleaned set) plus vehicle context
//! and decides itself what to exclude. Any failure (call, parse, validation)
//! yields exactly what `StatisticalPricingAnalyzer` would have produced, tagged
//! `PricingMethod::Fallback`.

pub mod prompt;
pub mod response;

pub use prompt::{build_prompt, sanitize_title, SYSTEM_PROMPT};
pub use response::{parse_response, strip_code_fence, AiPriceResponse};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::PriceAnalysis;
use crate::llm::{CompletionRequest, LanguageModel};

use super::analyzer::{PricingAnalyzer, PricingMethod, PricingOutcome, PricingRequest};
use super::statistical::StatisticalPricingAnalyzer;

/// Sampling settings for AI pricing (`[ai]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub enabled: bool,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            temperature: 0.1,
            max_output_tokens: 1024,
        }
    }
}

/// Result of one model evaluation, before any fallback is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum AiAttempt {
    Priced(PriceAnalysis),
    FallbackNeeded(String),
}

pub struct AiPricingAnalyzer {
    model: Option<Box<dyn LanguageModel>>,
    settings: AiSettings,
    statistical: StatisticalPricingAnalyzer,
}

impl AiPricingAnalyzer {
    pub fn new(model: Box<dyn LanguageModel>, settings: AiSettings) -> Self {
        Self {
            model: Some(model),
            settings,
            statistical: StatisticalPricingAnalyzer::new(),
        }
    }

    /// Analyzer that always delegates to the statistical path.
    pub fn disabled() -> Self {
        Self {
            model: None,
            settings: AiSettings {
                enabled: false,
                ..AiSettings::default()
            },
            statistical: StatisticalPricingAnalyzer::new(),
        }
    }

    /// Build from an optional model; `None` behaves like `disabled()`.
    pub fn from_parts(model: Option<Box<dyn LanguageModel>>, settings: AiSettings) -> Self {
        match model {
            Some(m) => Self::new(m, settings),
            None => Self::disabled(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.settings.enabled && self.model.is_some()
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    /// Ask the model once (retries live in the model wrapper) and validate.
    pub fn evaluate(&self, model: &dyn LanguageModel, request: &PricingRequest<'_>) -> AiAttempt {
        let completion = CompletionRequest {
            system: Some(SYSTEM_PROMPT.to_string()),
            prompt: build_prompt(request),
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        };

        let text = match model.complete(&completion) {
            Ok(text) => text,
            Err(e) => return AiAttempt::FallbackNeeded(format!("model call failed: {e}")),
        };
        debug!(part = %request.part.name, model = model.name(), chars = text.len(), "model reply");

        match parse_response(&text) {
            Ok(analysis) => AiAttempt::Priced(analysis),
            Err(reason) => AiAttempt::FallbackNeeded(reason),
        }
    }
}

impl PricingAnalyzer for AiPricingAnalyzer {
    fn name(&self) -> &str {
        "ai"
    }

    fn analyze(&self, request: &PricingRequest<'_>) -> PricingOutcome {
        let model = match self.model.as_deref() {
            Some(m) if self.settings.enabled && !request.listings.is_empty() => m,
            _ => return self.statistical.analyze(request),
        };

        match self.evaluate(model, request) {
            AiAttempt::Priced(analysis) => {
                info!(
                    part = %request.part.name,
                    low = analysis.low,
                    average = analysis.average,
                    high = analysis.high,
                    "AI pricing accepted"
                );
                PricingOutcome {
                    analysis,
                    method: PricingMethod::Ai,
                }
            }
            AiAttempt::FallbackNeeded(reason) => {
                warn!(
                    part = %request.part.name,
                    %reason,
                    "AI pricing failed; using statistical analysis"
                );
                PricingOutcome {
                    analysis: self
                        .statistical
                        .analyze_listings(request.part, request.listings),
                    method: PricingMethod::Fallback { reason },
                }
            }
        }
    }
}
