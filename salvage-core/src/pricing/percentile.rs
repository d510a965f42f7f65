use super::filter::PricedItem;

/// Linearly interpolated percentile on sorted data.
///
/// `p` is in [0, 100]. position = p/100 · (n − 1); the result blends the two
/// neighbouring values by the fractional part of the position. Returns 0 for
/// empty input and the sole value for a single element.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Totals of `items`, sorted ascending.
pub fn sorted_totals(items: &[PricedItem]) -> Vec<f64> {
    let mut totals: Vec<f64> = items.iter().map(|item| item.total).collect();
    totals.sort_by(|a, b| a.total_cmp(b));
    totals
}
