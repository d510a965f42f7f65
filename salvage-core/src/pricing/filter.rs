//! Listing filter trait and the removal log shared by all cleaning stages.

use crate::domain::RawListing;

/// A candidate price carried through the cleaning stages.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    /// Delivered price (price + shipping).
    pub total: f64,
    pub title: String,
}

impl PricedItem {
    pub fn new(total: f64, title: impl Into<String>) -> Self {
        Self {
            total,
            title: title.into(),
        }
    }
}

impl From<&RawListing> for PricedItem {
    fn from(listing: &RawListing) -> Self {
        Self {
            total: listing.total(),
            title: listing.title.clone(),
        }
    }
}

/// Ordered, human-readable record of why items were dropped.
///
/// Diagnostics only; nothing in the pricing math reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalLog {
    reasons: Vec<String>,
}

impl RemovalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: String) {
        self.reasons.push(reason);
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// First `n` reasons in removal order.
    pub fn samples(&self, n: usize) -> Vec<String> {
        self.reasons.iter().take(n).cloned().collect()
    }
}

/// One cleaning stage.
///
/// A filter receives only the survivors of the previous stage, returns its own
/// survivors in input order, and records one reason per dropped item.
pub trait ListingFilter: Send + Sync {
    /// Human-readable name (e.g., "keyword", "iqr_outlier").
    fn name(&self) -> &str;

    fn apply(&self, items: Vec<PricedItem>, log: &mut RemovalLog) -> Vec<PricedItem>;
}

/// "$12.50"
pub(crate) fn dollars(value: f64) -> String {
    format!("${value:.2}")
}

/// Shortest round-trip form that always shows a fractional part:
/// 100 → "100.0", 12.5 → "12.5".
pub(crate) fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
