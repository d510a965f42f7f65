//! Salvage Core: listing cleaning, pricing tiers, AI-assisted analysis, bid aggregation.
//!
//! This crate contains the pricing engine and the collaborators around it:
//! - Domain types (listings, part queries, price analyses, vehicles)
//! - Cleaning filters (keyword, minimum price, IQR outliers)
//! - Percentile estimation and magnitude-aware tier rounding
//! - Statistical and AI-assisted analyzers behind one `PricingAnalyzer` trait
//! - Bid aggregation across parts
//! - Blocking clients for VIN decoding, marketplace search and language models
//! - Run orchestration with per-part failure isolation

pub mod bid;
pub mod config;
pub mod data;
pub mod domain;
pub mod llm;
pub mod pricing;
pub mod run;

pub use bid::{BidAggregator, VehicleBidSummary, DEFAULT_BID_MULTIPLIER};
pub use config::{AppConfig, ConfigError, Credentials};
pub use domain::{PartPrices, PartQuery, PriceAnalysis, RawListing, TierTotals, VehicleInfo};
pub use pricing::{
    AiPricingAnalyzer, PricingAnalyzer, PricingMethod, PricingOutcome, PricingRequest,
    StatisticalPricingAnalyzer,
};
pub use run::{run_vehicle, RunError, RunOptions, RunProgress, RunReport, StdoutProgress};
