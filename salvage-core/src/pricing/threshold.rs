use super::filter::{decimal, dollars, ListingFilter, PricedItem, RemovalLog};

/// Drops items whose total is strictly below the part's configured minimum.
///
/// A minimum of zero (or less) disables the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdFilter {
    minimum: f64,
}

impl ThresholdFilter {
    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }

    pub fn is_active(&self) -> bool {
        self.minimum > 0.0
    }
}

impl ListingFilter for ThresholdFilter {
    fn name(&self) -> &str {
        "minimum_price"
    }

    fn apply(&self, items: Vec<PricedItem>, log: &mut RemovalLog) -> Vec<PricedItem> {
        if !self.is_active() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| {
                if item.total < self.minimum {
                    log.record(format!(
                        "{} - Below minimum (${})",
                        dollars(item.total),
                        decimal(self.minimum)
                    ));
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(totals: &[f64]) -> Vec<PricedItem> {
        totals.iter().map(|&t| PricedItem::new(t, "part")).collect()
    }

    #[test]
    fn drops_strictly_below_minimum() {
        let mut log = RemovalLog::new();
        let kept = ThresholdFilter::new(100.0).apply(items(&[99.99, 100.0, 250.0]), &mut log);
        let totals: Vec<f64> = kept.iter().map(|i| i.total).collect();
        assert_eq!(totals, vec![100.0, 250.0]);
        assert_eq!(log.reasons(), &["$99.99 - Below minimum ($100.0)".to_string()]);
    }

    #[test]
    fn zero_minimum_is_noop() {
        let mut log = RemovalLog::new();
        let kept = ThresholdFilter::new(0.0).apply(items(&[0.0, 1.0]), &mut log);
        assert_eq!(kept.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn negative_minimum_is_noop() {
        let mut log = RemovalLog::new();
        let kept = ThresholdFilter::new(-5.0).apply(items(&[1.0]), &mut log);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn fractional_minimum_keeps_its_digits() {
        let mut log = RemovalLog::new();
        ThresholdFilter::new(12.5).apply(items(&[3.0]), &mut log);
        assert_eq!(log.reasons(), &["$3.00 - Below minimum ($12.5)".to_string()]);
    }
}
