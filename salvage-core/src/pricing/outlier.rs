//! IQR outlier filter.
//!
//! Quartiles here are positional (the values at indices ⌊n/4⌋ and ⌊3n/4⌋ of
//! the sorted list), not the interpolated percentiles used for pricing tiers.
//! The two disagree slightly on small samples; fences must use the positional
//! form.

use super::filter::{dollars, ListingFilter, PricedItem, RemovalLog};
use super::percentile::sorted_totals;

/// Below this many items, outlier removal is skipped entirely.
pub const MIN_OUTLIER_SAMPLE: usize = 10;

/// Fence multiplier applied to the IQR.
pub const IQR_FENCE: f64 = 1.5;

/// `(lower, upper)` fences for a sorted, non-empty price list.
pub fn iqr_bounds(sorted: &[f64]) -> (f64, f64) {
    let n = sorted.len();
    let q1 = sorted[n / 4];
    let q3 = sorted[3 * n / 4];
    let iqr = q3 - q1;
    (q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutlierFilter;

impl OutlierFilter {
    pub fn new() -> Self {
        Self
    }
}

impl ListingFilter for OutlierFilter {
    fn name(&self) -> &str {
        "iqr_outlier"
    }

    fn apply(&self, items: Vec<PricedItem>, log: &mut RemovalLog) -> Vec<PricedItem> {
        if items.len() < MIN_OUTLIER_SAMPLE {
            return items;
        }

        let (lower, upper) = iqr_bounds(&sorted_totals(&items));
        tracing::debug!(lower, upper, n = items.len(), "IQR fences");

        items
            .into_iter()
            .filter(|item| {
                if item.total < lower || item.total > upper {
                    log.record(format!(
                        "{} - Statistical outlier (IQR method)",
                        dollars(item.total)
                    ));
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}
