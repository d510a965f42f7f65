//! Property tests for pricing invariants.
//!
//! Uses proptest to verify:
//! 1. Tier ordering: low <= average <= high for any listing set
//! 2. Outlier gate: fewer than 10 items pass through untouched
//! 3. Percentiles stay within the data and grow with p
//! 4. AI fallback identity: an unusable model reply gives the statistical result
//! 5. Removal accounting: considered + removed = listings seen

use proptest::prelude::*;
use salvage_core::llm::{CompletionRequest, LanguageModel, LlmError};
use salvage_core::pricing::{
    percentile_sorted, AiSettings, ListingFilter, OutlierFilter, PricedItem, RemovalLog,
    MIN_OUTLIER_SAMPLE,
};
use salvage_core::{
    AiPricingAnalyzer, PartQuery, PricingAnalyzer, PricingMethod, PricingRequest, RawListing,
    StatisticalPricingAnalyzer,
};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_listing() -> impl Strategy<Value = RawListing> {
    (1.0..4000.0_f64, 0.0..250.0_f64).prop_map(|(price, shipping)| {
        RawListing::new(
            "Used engine assembly",
            (price * 100.0).round() / 100.0,
            (shipping * 100.0).round() / 100.0,
        )
    })
}

fn arb_listings(max: usize) -> impl Strategy<Value = Vec<RawListing>> {
    prop::collection::vec(arb_listing(), 0..max)
}

fn arb_sorted_prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0..10_000.0_f64, 1..80).prop_map(|mut v| {
        v.sort_by(f64::total_cmp);
        v
    })
}

/// Model that always answers with the same text.
struct Canned(&'static str);

impl LanguageModel for Canned {
    fn name(&self) -> &str {
        "canned"
    }

    fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        Ok(self.0.to_string())
    }
}

// ── 1. Tier ordering ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn tiers_are_ordered(listings in arb_listings(60), minimum in 0.0..800.0_f64) {
        let part = PartQuery::new("engine", "33615").with_minimum_price(minimum);
        let a = StatisticalPricingAnalyzer::new().analyze_listings(&part, &listings);
        prop_assert!(a.low <= a.average, "low {} > average {}", a.low, a.average);
        prop_assert!(a.average <= a.high, "average {} > high {}", a.average, a.high);
        prop_assert!(a.low >= 0.0);
    }

    /// Accounting: every raw listing is either considered or removed.
    #[test]
    fn considered_plus_removed_is_total(listings in arb_listings(60)) {
        let part = PartQuery::new("engine", "33615").with_minimum_price(200.0);
        let a = StatisticalPricingAnalyzer::new().analyze_listings(&part, &listings);
        prop_assert_eq!(a.items_considered + a.items_removed, listings.len());
        prop_assert!(a.removal_samples.len() <= 3);
    }
}

// ── 2. Outlier gate ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn outlier_filter_noop_below_ten(
        totals in prop::collection::vec(0.0..100_000.0_f64, 0..MIN_OUTLIER_SAMPLE),
    ) {
        let items: Vec<PricedItem> = totals.iter().map(|&t| PricedItem::new(t, "x")).collect();
        let mut log = RemovalLog::new();
        let kept = OutlierFilter::new().apply(items.clone(), &mut log);
        prop_assert_eq!(kept, items);
        prop_assert!(log.is_empty());
    }
}

// ── 3. Percentiles ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn percentile_bounded_and_monotone(sorted in arb_sorted_prices(), p in 0.0..100.0_f64, q in 0.0..100.0_f64) {
        let (lo_p, hi_p) = if p <= q { (p, q) } else { (q, p) };
        let a = percentile_sorted(&sorted, lo_p);
        let b = percentile_sorted(&sorted, hi_p);
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        prop_assert!(a >= min - 1e-9 && a <= max + 1e-9);
        prop_assert!(a <= b + 1e-9);
    }
}

// ── 4. AI fallback identity ──────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn unusable_reply_matches_statistical(listings in arb_listings(40)) {
        let part = PartQuery::new("engine", "33615");
        let ai = AiPricingAnalyzer::new(Box::new(Canned("no idea, sorry")), AiSettings::default());
        let outcome = ai.analyze(&PricingRequest::new(&part, &listings));
        let expected = StatisticalPricingAnalyzer::new().analyze_listings(&part, &listings);

        prop_assert_eq!(outcome.analysis, expected);
        if listings.is_empty() {
            prop_assert_eq!(outcome.method, PricingMethod::Statistical);
        } else {
            prop_assert!(
                matches!(outcome.method, PricingMethod::Fallback { .. }),
                "expected fallback method"
            );
        }
    }
}
