//! Run orchestration: VIN → vehicle → per-part listings → pricing → bid.
//!
//! Parts are searched and priced sequentially in configured order, so progress
//! is reported in order. A search failure for one part yields a zero-valued
//! part plus a diagnostic; only an invalid VIN, a failed decode, or a fatal
//! marketplace error (credentials, authentication) aborts the run.
//!
//! `analyze_all` is the offline entry point: listings already in hand, pricing
//! fanned out over rayon with part order preserved.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::bid::{BidAggregator, VehicleBidSummary, DEFAULT_BID_MULTIPLIER};
use crate::data::{ListingSource, MarketplaceError, Vin, VinDecoder, VinError};
use crate::domain::{DatasetHash, PartPrices, PartQuery, RawListing, VehicleInfo};
use crate::pricing::{PricingAnalyzer, PricingMethod, PricingOutcome, PricingRequest};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    InvalidVin(VinError),

    #[error("VIN decode failed: {0}")]
    VinDecode(#[source] VinError),

    #[error("marketplace unavailable: {0}")]
    Marketplace(#[source] MarketplaceError),
}

// ── Reports ──

/// Everything recorded about one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartReport {
    pub part: PartQuery,
    pub listings_found: usize,
    pub dataset_hash: DatasetHash,
    pub outcome: PricingOutcome,
    /// Set when the listings could not be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PartReport {
    pub fn is_failed(&self) -> bool {
        self.outcome.analysis.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleInfo>,
    pub generated_at: DateTime<Utc>,
    pub parts: Vec<PartReport>,
    #[serde(default)]
    pub diagnostics: Vec<String>,
    pub summary: VehicleBidSummary,
}

impl RunReport {
    /// Assemble a report and compute the bid summary from the parts.
    pub fn new(
        vin: Option<String>,
        vehicle: Option<VehicleInfo>,
        parts: Vec<PartReport>,
        diagnostics: Vec<String>,
        multiplier: f64,
    ) -> Self {
        let prices: Vec<PartPrices> = parts
            .iter()
            .map(|p| PartPrices::from(p.outcome.analysis.clone()))
            .collect();
        let summary = BidAggregator::new(multiplier).aggregate(&prices);
        Self {
            vin,
            vehicle,
            generated_at: Utc::now(),
            parts,
            diagnostics,
            summary,
        }
    }

    /// Names of parts whose three tiers are all zero.
    pub fn failed_parts(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.is_failed())
            .map(|p| p.part.name.as_str())
            .collect()
    }

    /// Part name → analysis, the shape older result files used.
    pub fn results_map(&self) -> BTreeMap<String, PartPrices> {
        self.parts
            .iter()
            .map(|p| {
                (
                    p.part.name.clone(),
                    PartPrices::from(p.outcome.analysis.clone()),
                )
            })
            .collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Read a results file: either a full `RunReport` or a bare part → prices map
/// (whose values may be legacy scalars).
pub fn load_results_map(json: &str) -> serde_json::Result<BTreeMap<String, PartPrices>> {
    match serde_json::from_str::<RunReport>(json) {
        Ok(report) => Ok(report.results_map()),
        Err(_) => serde_json::from_str(json),
    }
}

// ── Progress ──

/// Progress callback for a vehicle run.
pub trait RunProgress: Send + Sync {
    fn on_vehicle(&self, vin: &Vin, vehicle: &VehicleInfo);

    fn on_part_start(&self, part: &PartQuery, index: usize, total: usize);

    fn on_part_complete(&self, report: &PartReport, index: usize, total: usize);

    fn on_run_complete(&self, report: &RunReport);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl RunProgress for StdoutProgress {
    fn on_vehicle(&self, vin: &Vin, vehicle: &VehicleInfo) {
        println!("Vehicle: {} ({vin})", vehicle.describe());
    }

    fn on_part_start(&self, part: &PartQuery, index: usize, total: usize) {
        println!("[{}/{}] Searching {}...", index + 1, total, part.name);
    }

    fn on_part_complete(&self, report: &PartReport, _index: usize, _total: usize) {
        let a = &report.outcome.analysis;
        match &report.error {
            Some(e) => println!("  FAIL: {}: {e}", report.part.name),
            None => println!(
                "  {}: {} listings, {} kept -> ${:.0} / ${:.0} / ${:.0} ({})",
                report.part.name,
                report.listings_found,
                a.items_considered,
                a.low,
                a.average,
                a.high,
                report.outcome.method.label()
            ),
        }
    }

    fn on_run_complete(&self, report: &RunReport) {
        let failed = report.failed_parts().len();
        let total = report.parts.len();
        println!(
            "\nRun complete: {}/{total} parts priced, {failed} without data",
            total - failed
        );
    }
}

/// Reporter that prints nothing (JSON output, tests).
pub struct SilentProgress;

impl RunProgress for SilentProgress {
    fn on_vehicle(&self, _vin: &Vin, _vehicle: &VehicleInfo) {}
    fn on_part_start(&self, _part: &PartQuery, _index: usize, _total: usize) {}
    fn on_part_complete(&self, _report: &PartReport, _index: usize, _total: usize) {}
    fn on_run_complete(&self, _report: &RunReport) {}
}

// ── Orchestration ──

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub multiplier: f64,
    /// User instructions embedded in AI prompts.
    pub instructions: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_BID_MULTIPLIER,
            instructions: None,
        }
    }
}

/// The external services a run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub decoder: &'a dyn VinDecoder,
    pub source: &'a dyn ListingSource,
    pub analyzer: &'a dyn PricingAnalyzer,
}

/// Price one part's listings.
pub fn price_part(
    part: &PartQuery,
    listings: &[RawListing],
    vehicle: Option<&VehicleInfo>,
    instructions: Option<&str>,
    analyzer: &dyn PricingAnalyzer,
) -> PartReport {
    let mut request = PricingRequest::new(part, listings);
    if let Some(v) = vehicle {
        request = request.with_vehicle(v);
    }
    if let Some(text) = instructions {
        request = request.with_instructions(text);
    }

    PartReport {
        part: part.clone(),
        listings_found: listings.len(),
        dataset_hash: DatasetHash::of_listings(listings),
        outcome: analyzer.analyze(&request),
        error: None,
    }
}

/// Listings already fetched for one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartListings {
    pub part: PartQuery,
    pub listings: Vec<RawListing>,
}

/// Price many parts in parallel. Output order matches input order.
pub fn analyze_all(
    inputs: &[PartListings],
    vehicle: Option<&VehicleInfo>,
    instructions: Option<&str>,
    analyzer: &dyn PricingAnalyzer,
) -> Vec<PartReport> {
    inputs
        .par_iter()
        .map(|input| price_part(&input.part, &input.listings, vehicle, instructions, analyzer))
        .collect()
}

fn fallback_diagnostic(report: &PartReport) -> Option<String> {
    match &report.outcome.method {
        PricingMethod::Fallback { reason } => Some(format!(
            "{}: AI pricing unavailable, used statistical analysis ({reason})",
            report.part.name
        )),
        _ => None,
    }
}

/// Full run for one VIN.
pub fn run_vehicle(
    vin_input: &str,
    parts: &[PartQuery],
    deps: Collaborators<'_>,
    options: &RunOptions,
    progress: &dyn RunProgress,
) -> Result<RunReport, RunError> {
    let vin = Vin::parse(vin_input).map_err(RunError::InvalidVin)?;
    let vehicle = deps.decoder.decode(&vin).map_err(RunError::VinDecode)?;
    progress.on_vehicle(&vin, &vehicle);
    info!(%vin, vehicle = %vehicle.describe(), parts = parts.len(), "run started");

    let total = parts.len();
    let mut reports = Vec::with_capacity(total);
    let mut diagnostics = Vec::new();

    for (index, part) in parts.iter().enumerate() {
        progress.on_part_start(part, index, total);

        let report = match deps.source.search(&vehicle, part) {
            Ok(listings) => price_part(
                part,
                &listings,
                Some(&vehicle),
                options.instructions.as_deref(),
                deps.analyzer,
            ),
            Err(e) if e.is_fatal() => return Err(RunError::Marketplace(e)),
            Err(e) => {
                warn!(part = %part.name, error = %e, "search failed; pricing part at zero");
                diagnostics.push(format!("{}: search failed: {e}", part.name));
                PartReport {
                    part: part.clone(),
                    listings_found: 0,
                    dataset_hash: DatasetHash::of_listings(&[]),
                    outcome: PricingOutcome::unavailable(),
                    error: Some(e.to_string()),
                }
            }
        };

        if let Some(d) = fallback_diagnostic(&report) {
            diagnostics.push(d);
        }
        progress.on_part_complete(&report, index, total);
        reports.push(report);
    }

    let report = RunReport::new(
        Some(vin.to_string()),
        Some(vehicle),
        reports,
        diagnostics,
        options.multiplier,
    );
    info!(
        bid_low = report.summary.bids.low,
        bid_average = report.summary.bids.average,
        bid_high = report.summary.bids.high,
        failed = report.failed_parts().len(),
        "run complete"
    );
    progress.on_run_complete(&report);
    Ok(report)
}
