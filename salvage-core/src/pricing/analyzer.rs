//! Pricing analyzer strategy.
//!
//! Two implementations: `StatisticalPricingAnalyzer` (deterministic, always
//! available) and `AiPricingAnalyzer` (model-backed, falls back to the
//! statistical one). Callers hold a `&dyn PricingAnalyzer` and never see
//! which path ran except through `PricingOutcome::method`.

use serde::{Deserialize, Serialize};

use crate::domain::{PartQuery, PriceAnalysis, RawListing, VehicleInfo};

/// Everything an analyzer may look at for one part.
///
/// The statistical analyzer only reads `part` and `listings`; vehicle context
/// and user instructions exist for the AI prompt.
#[derive(Debug, Clone, Copy)]
pub struct PricingRequest<'a> {
    pub part: &'a PartQuery,
    pub listings: &'a [RawListing],
    pub vehicle: Option<&'a VehicleInfo>,
    pub instructions: Option<&'a str>,
}

impl<'a> PricingRequest<'a> {
    pub fn new(part: &'a PartQuery, listings: &'a [RawListing]) -> Self {
        Self {
            part,
            listings,
            vehicle: None,
            instructions: None,
        }
    }

    pub fn with_vehicle(mut self, vehicle: &'a VehicleInfo) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    pub fn with_instructions(mut self, instructions: &'a str) -> Self {
        self.instructions = Some(instructions);
        self
    }
}

/// Which path produced an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingMethod {
    Statistical,
    Ai,
    /// AI was attempted and failed; numbers are the statistical result.
    Fallback { reason: String },
}

impl PricingMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PricingMethod::Statistical => "statistical",
            PricingMethod::Ai => "ai",
            PricingMethod::Fallback { .. } => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOutcome {
    pub analysis: PriceAnalysis,
    pub method: PricingMethod,
}

impl PricingOutcome {
    /// Zero-valued outcome for a part whose listings could not be fetched.
    pub fn unavailable() -> Self {
        Self {
            analysis: PriceAnalysis::zero(0),
            method: PricingMethod::Statistical,
        }
    }
}

/// Trait for pricing analyzers.
///
/// # Contract
/// `analyze` never fails: every failure mode inside an implementation must be
/// converted into a valid `PriceAnalysis` before returning.
pub trait PricingAnalyzer: Send + Sync {
    /// Human-readable name (e.g., "statistical", "ai").
    fn name(&self) -> &str;

    fn analyze(&self, request: &PricingRequest<'_>) -> PricingOutcome;
}
