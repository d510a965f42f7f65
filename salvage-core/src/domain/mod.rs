//! Domain types for the salvage bid engine

pub mod analysis;
pub mod ids;
pub mod listing;
pub mod part;
pub mod vehicle;

pub use analysis::{PartPrices, PriceAnalysis, RawPercentiles, TierTotals};
pub use ids::DatasetHash;
pub use listing::RawListing;
pub use part::{default_parts, PartQuery};
pub use vehicle::VehicleInfo;
