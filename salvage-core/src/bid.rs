//! Vehicle-level bid recommendation.

use serde::{Deserialize, Serialize};

use crate::domain::{PartPrices, TierTotals};

/// Share of summed part value offered as a bid.
pub const DEFAULT_BID_MULTIPLIER: f64 = 0.20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleBidSummary {
    pub totals: TierTotals,
    pub bids: TierTotals,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BidAggregator {
    multiplier: f64,
}

impl Default for BidAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_BID_MULTIPLIER)
    }
}

impl BidAggregator {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Sum every part's tiers and scale by the multiplier.
    ///
    /// Legacy scalar entries contribute the same value to all three tiers.
    pub fn aggregate<'a, I>(&self, parts: I) -> VehicleBidSummary
    where
        I: IntoIterator<Item = &'a PartPrices>,
    {
        let totals = parts
            .into_iter()
            .fold(TierTotals::default(), |acc, p| acc + p.tiers());
        VehicleBidSummary {
            totals,
            bids: totals.scale(self.multiplier),
            multiplier: self.multiplier,
        }
    }
}
