//! Pricing engine: turns raw listings into three price tiers.
//!
//! Pipeline (statistical path):
//! 1. `KeywordFilter`: drop sub-component listings by title
//! 2. `ThresholdFilter`: drop listings below the part's minimum price
//! 3. `OutlierFilter`: drop IQR outliers (only with 10+ survivors)
//! 4. `percentile_sorted`: interpolated percentiles on the cleaned set
//! 5. `TierRounder`: magnitude-aware rounding and tier separation
//!
//! The AI path (`AiPricingAnalyzer`) asks a language model for the same three
//! tiers and falls back to the statistical path on any failure.

pub mod ai;
pub mod analyzer;
pub mod filter;
pub mod keyword;
pub mod outlier;
pub mod percentile;
pub mod statistical;
pub mod threshold;
pub mod tiers;

pub use ai::{AiAttempt, AiPricingAnalyzer, AiSettings};
pub use analyzer::{PricingAnalyzer, PricingMethod, PricingOutcome, PricingRequest};
pub use filter::{ListingFilter, PricedItem, RemovalLog};
pub use keyword::{suspicious_keywords, KeywordFilter, SUSPICIOUS_KEYWORDS};
pub use outlier::{iqr_bounds, OutlierFilter, IQR_FENCE, MIN_OUTLIER_SAMPLE};
pub use percentile::{percentile_sorted, sorted_totals};
pub use statistical::StatisticalPricingAnalyzer;
pub use threshold::ThresholdFilter;
pub use tiers::{separation_step, Regime, TierRounder, Tiers};
