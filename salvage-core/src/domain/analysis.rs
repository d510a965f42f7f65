//! Price analysis results and the per-part entries that feed bid aggregation.

use serde::{Deserialize, Serialize};

/// Unrounded percentile values behind a statistical analysis.
///
/// Which percentiles these are depends on the regime: p10/p30/p50 for
/// standard samples, p5/p25/p50 for small ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPercentiles {
    pub low: f64,
    pub average: f64,
    pub high: f64,
}

/// Three price tiers for one part.
///
/// `low` is the budget tier, `average` the standard tier and `high` the
/// premium tier. Once tier separation has run, `low <= average <= high`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub low: f64,
    pub average: f64,
    pub high: f64,
    pub items_considered: usize,
    pub items_removed: usize,
    /// First few removal reasons, in removal order.
    #[serde(default)]
    pub removal_samples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    /// Max minus min of the cleaned set.
    #[serde(default)]
    pub price_range: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_percentiles: Option<RawPercentiles>,
}

impl PriceAnalysis {
    /// Maximum number of removal reasons kept on an analysis.
    pub const MAX_REMOVAL_SAMPLES: usize = 3;

    /// All-zero analysis: no data, or everything was filtered out.
    pub fn zero(items_removed: usize) -> Self {
        Self {
            low: 0.0,
            average: 0.0,
            high: 0.0,
            items_considered: 0,
            items_removed,
            removal_samples: Vec::new(),
            rationale: None,
            price_range: 0.0,
            raw_percentiles: None,
        }
    }

    /// Same value in all three tiers.
    pub fn flat(value: f64, items_considered: usize) -> Self {
        Self {
            low: value,
            average: value,
            high: value,
            items_considered,
            ..Self::zero(0)
        }
    }

    pub fn tiers(&self) -> TierTotals {
        TierTotals {
            low: self.low,
            average: self.average,
            high: self.high,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.low == 0.0 && self.average == 0.0 && self.high == 0.0
    }
}

/// Sums (or scaled sums) of the three tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TierTotals {
    pub low: f64,
    pub average: f64,
    pub high: f64,
}

impl TierTotals {
    pub fn uniform(value: f64) -> Self {
        Self {
            low: value,
            average: value,
            high: value,
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            low: self.low * factor,
            average: self.average * factor,
            high: self.high * factor,
        }
    }
}

impl std::ops::Add for TierTotals {
    type Output = TierTotals;

    fn add(self, rhs: TierTotals) -> TierTotals {
        TierTotals {
            low: self.low + rhs.low,
            average: self.average + rhs.average,
            high: self.high + rhs.high,
        }
    }
}

/// A part's entry in a results map.
///
/// Older result files stored a single number per part; those still load and
/// count that number toward every tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartPrices {
    Tiered(PriceAnalysis),
    Scalar(f64),
}

impl PartPrices {
    pub fn tiers(&self) -> TierTotals {
        match self {
            PartPrices::Tiered(analysis) => analysis.tiers(),
            PartPrices::Scalar(value) => TierTotals::uniform(*value),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            PartPrices::Tiered(analysis) => analysis.is_zero(),
            PartPrices::Scalar(value) => *value == 0.0,
        }
    }
}

impl From<PriceAnalysis> for PartPrices {
    fn from(analysis: PriceAnalysis) -> Self {
        PartPrices::Tiered(analysis)
    }
}
