//! Deterministic pricing pipeline: the analyzer that is always available.
//!
//! Stages: Insufficient → Cleaning → Estimating → Rounding → Done.
//! - Insufficient: 0 listings → all zeros; 1–2 listings → their mean in every
//!   tier, no cleaning.
//! - Cleaning: keyword → minimum price → IQR outliers, each stage fed only the
//!   previous stage's survivors. Nothing left → all zeros with every listing
//!   counted as removed.
//! - Estimating / Rounding: regime percentiles, then `TierRounder`.

use tracing::debug;

use crate::domain::{PartQuery, PriceAnalysis, RawListing};

use super::analyzer::{PricingAnalyzer, PricingMethod, PricingOutcome, PricingRequest};
use super::filter::{ListingFilter, PricedItem, RemovalLog};
use super::keyword::KeywordFilter;
use super::outlier::OutlierFilter;
use super::percentile::sorted_totals;
use super::threshold::ThresholdFilter;
use super::tiers::{Regime, TierRounder};

/// Fewer raw listings than this skip cleaning and use the plain mean.
const MIN_CLEANING_SAMPLE: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalPricingAnalyzer;

impl StatisticalPricingAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// The three cleaning stages for a part, in application order.
    fn cleaning_stages(part: &PartQuery) -> Vec<Box<dyn ListingFilter>> {
        vec![
            Box::new(KeywordFilter::for_part(&part.name)),
            Box::new(ThresholdFilter::new(part.minimum_price)),
            Box::new(OutlierFilter::new()),
        ]
    }

    pub fn analyze_listings(&self, part: &PartQuery, listings: &[RawListing]) -> PriceAnalysis {
        let original_count = listings.len();

        if original_count == 0 {
            return PriceAnalysis::zero(0);
        }

        if original_count < MIN_CLEANING_SAMPLE {
            let mean = listings.iter().map(RawListing::total).sum::<f64>() / original_count as f64;
            return PriceAnalysis::flat(mean, original_count);
        }

        let mut log = RemovalLog::new();
        let mut items: Vec<PricedItem> = listings.iter().map(PricedItem::from).collect();
        for stage in Self::cleaning_stages(part) {
            let before = items.len();
            items = stage.apply(items, &mut log);
            debug!(
                part = %part.name,
                stage = stage.name(),
                removed = before - items.len(),
                remaining = items.len(),
                "cleaning stage"
            );
        }

        if items.is_empty() {
            return PriceAnalysis {
                removal_samples: log.samples(PriceAnalysis::MAX_REMOVAL_SAMPLES),
                ..PriceAnalysis::zero(original_count)
            };
        }

        let sorted = sorted_totals(&items);
        let n = sorted.len();
        let regime = Regime::for_sample_size(n);
        let raw = regime.raw_percentiles(&sorted);
        let tiers = TierRounder::new(regime).finalize(raw, &sorted);

        debug!(
            part = %part.name,
            ?regime,
            raw_low = raw.low,
            raw_average = raw.average,
            raw_high = raw.high,
            low = tiers.low,
            average = tiers.average,
            high = tiers.high,
            "tiers computed"
        );

        PriceAnalysis {
            low: tiers.low,
            average: tiers.average,
            high: tiers.high,
            items_considered: n,
            items_removed: original_count - n,
            removal_samples: log.samples(PriceAnalysis::MAX_REMOVAL_SAMPLES),
            rationale: None,
            price_range: sorted[n - 1] - sorted[0],
            raw_percentiles: Some(raw),
        }
    }
}

impl PricingAnalyzer for StatisticalPricingAnalyzer {
    fn name(&self) -> &str {
        "statistical"
    }

    fn analyze(&self, request: &PricingRequest<'_>) -> PricingOutcome {
        PricingOutcome {
            analysis: self.analyze_listings(request.part, request.listings),
            method: PricingMethod::Statistical,
        }
    }
}
