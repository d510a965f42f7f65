//! Collaborator traits and structured error types.
//!
//! `VinDecoder` and `ListingSource` abstract over the external services (NHTSA
//! vPIC, eBay Browse) so the run orchestrator can be driven by scripted
//! implementations in tests.

use thiserror::Error;

use crate::domain::{PartQuery, RawListing, VehicleInfo};

use super::vin::Vin;

/// Errors from VIN validation and decoding.
#[derive(Debug, Error)]
pub enum VinError {
    #[error("invalid VIN '{vin}': {reason}")]
    Invalid { vin: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("decoder returned HTTP {0}")]
    Http(u16),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("decoder did not return {0}")]
    Incomplete(String),

    #[error("VIN decode failed after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: Box<VinError> },
}

/// Errors from marketplace authentication and search.
///
/// Displayable in both log lines and the CLI's diagnostics block.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("marketplace credentials missing: {0}")]
    MissingCredentials(String),

    #[error("marketplace authentication failed: {0}")]
    Authentication(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("all {queries} search queries failed (last: {last})")]
    AllQueriesFailed { queries: usize, last: String },
}

impl MarketplaceError {
    /// Errors that make every later search pointless, so the run stops.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MarketplaceError::MissingCredentials(_) | MarketplaceError::Authentication(_)
        )
    }
}

/// Trait for VIN decoders.
pub trait VinDecoder: Send + Sync {
    /// Human-readable name of this decoder.
    fn name(&self) -> &str;

    /// Decode a validated VIN. Year, make and model must be present on success.
    fn decode(&self, vin: &Vin) -> Result<VehicleInfo, VinError>;
}

/// Trait for marketplace listing sources.
///
/// Implementations own authentication, query building and de-duplication.
/// The pricing engine only ever sees the returned `RawListing`s.
pub trait ListingSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch listings for one part of one vehicle.
    fn search(
        &self,
        vehicle: &VehicleInfo,
        part: &PartQuery,
    ) -> Result<Vec<RawListing>, MarketplaceError>;
}

/// The two search strings issued per part: full year, then two-digit year.
pub fn search_queries(vehicle: &VehicleInfo, part: &PartQuery) -> [String; 2] {
    [
        format!(
            "{} {} {} {}",
            vehicle.year, vehicle.make, vehicle.model, part.name
        ),
        format!(
            "{} {} {} {}",
            vehicle.short_year(),
            vehicle.make,
            vehicle.model,
            part.name
        ),
    ]
}
