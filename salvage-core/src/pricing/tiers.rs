//! Tier rounding: turns raw percentiles into "nice" dollar amounts.
//!
//! Two regimes, chosen by cleaned-set size:
//!
//! | regime       | n     | percentiles  | increments                          |
//! |--------------|-------|--------------|-------------------------------------|
//! | Standard     | ≥ 10  | p10/p30/p50  | <$100 → $5, <$500 → $10, else $25   |
//! | SmallSample  | < 10  | p5/p25/p50   | <$50 → $1, <$200 → $5, else $10     |
//!
//! The increment is picked from the magnitude of each raw percentile on its
//! own. Ties round half to even, so $52.50 in the $5 bracket becomes $50.

use serde::{Deserialize, Serialize};

use crate::domain::RawPercentiles;

use super::percentile::percentile_sorted;

/// Sample-size regime for percentile selection and rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Standard,
    SmallSample,
}

impl Regime {
    /// Smallest cleaned-set size that uses the standard regime.
    pub const STANDARD_MIN_SAMPLE: usize = 10;

    pub fn for_sample_size(n: usize) -> Self {
        if n >= Self::STANDARD_MIN_SAMPLE {
            Regime::Standard
        } else {
            Regime::SmallSample
        }
    }

    /// Percentiles for the (low, average, high) tiers.
    pub fn percentiles(self) -> [f64; 3] {
        match self {
            Regime::Standard => [10.0, 30.0, 50.0],
            Regime::SmallSample => [5.0, 25.0, 50.0],
        }
    }

    /// Rounding increment for a raw value.
    pub fn increment(self, raw: f64) -> f64 {
        match self {
            Regime::Standard => {
                if raw < 100.0 {
                    5.0
                } else if raw < 500.0 {
                    10.0
                } else {
                    25.0
                }
            }
            Regime::SmallSample => {
                if raw < 50.0 {
                    1.0
                } else if raw < 200.0 {
                    5.0
                } else {
                    10.0
                }
            }
        }
    }

    pub fn round(self, raw: f64) -> f64 {
        let increment = self.increment(raw);
        (raw / increment).round_ties_even() * increment
    }

    /// Raw (unrounded) tier percentiles of a sorted price list.
    pub fn raw_percentiles(self, sorted: &[f64]) -> RawPercentiles {
        let [low, average, high] = self.percentiles();
        RawPercentiles {
            low: percentile_sorted(sorted, low),
            average: percentile_sorted(sorted, average),
            high: percentile_sorted(sorted, high),
        }
    }
}

/// Rounded budget / standard / premium prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tiers {
    pub low: f64,
    pub average: f64,
    pub high: f64,
}

impl Tiers {
    pub fn is_collapsed(&self) -> bool {
        self.low == self.average && self.average == self.high
    }
}

/// Step used to pull collapsed tiers apart, from the observed price range.
///
/// `None` when the range is too narrow (≤ $10) to justify separation.
pub fn separation_step(range: f64) -> Option<f64> {
    if range <= 10.0 {
        None
    } else if range < 50.0 {
        Some(5.0)
    } else if range < 200.0 {
        Some(10.0)
    } else {
        Some(25.0)
    }
}

/// Rounds raw percentiles and enforces tier separation.
#[derive(Debug, Clone, Copy)]
pub struct TierRounder {
    regime: Regime,
}

impl TierRounder {
    /// Separation only applies to cleaned sets at least this large.
    pub const MIN_SEPARATION_SAMPLE: usize = 3;

    pub fn new(regime: Regime) -> Self {
        Self { regime }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn round(&self, raw: RawPercentiles) -> Tiers {
        Tiers {
            low: self.regime.round(raw.low),
            average: self.regime.round(raw.average),
            high: self.regime.round(raw.high),
        }
    }

    /// Pull collapsed tiers apart using the spread of the cleaned set.
    ///
    /// Low never drops below the cheapest observed price and never rises
    /// above the standard tier; the standard tier itself is left alone.
    pub fn separate(&self, tiers: Tiers, sorted: &[f64]) -> Tiers {
        if !tiers.is_collapsed() || sorted.len() < Self::MIN_SEPARATION_SAMPLE {
            return tiers;
        }
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let Some(step) = separation_step(max - min) else {
            return tiers;
        };
        Tiers {
            low: (tiers.low - step).max(min).min(tiers.average),
            average: tiers.average,
            high: tiers.high + step,
        }
    }

    /// `round` followed by `separate`.
    pub fn finalize(&self, raw: RawPercentiles, sorted: &[f64]) -> Tiers {
        self.separate(self.round(raw), sorted)
    }
}
