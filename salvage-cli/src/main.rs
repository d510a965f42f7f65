//! Salvage CLI: price a vehicle's parts and recommend an auction bid.
//!
//! Commands:
//! - `bid`: decode a VIN, search the marketplace, price every part, recommend a bid
//! - `analyze`: price listings from a CSV file (offline, no marketplace calls)
//! - `summarize`: recompute totals and bids from a saved results file
//! - `instructions show|set|clear`: manage free-text instructions for AI pricing
//! - `parts`: show the parts list in effect

mod report;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use salvage_core::data::{
    load_parts_or_default, EbayClient, FileInstructionStore, InstructionStore, NhtsaDecoder,
};
use salvage_core::llm::build_language_model;
use salvage_core::run::{
    analyze_all, load_results_map, Collaborators, PartListings, SilentProgress,
};
use salvage_core::{
    AiPricingAnalyzer, AppConfig, BidAggregator, Credentials, PartQuery, RawListing, RunOptions,
    RunProgress, RunReport, StdoutProgress, VehicleInfo,
};

#[derive(Parser)]
#[command(
    name = "salvage",
    about = "Salvage CLI: junkyard part valuation and auction bid recommendation"
)]
struct Cli {
    /// Config file. Defaults to ./salvage.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a VIN, price its parts from marketplace listings, and recommend a bid.
    Bid {
        /// 17-character vehicle identification number.
        vin: String,

        /// Parts list CSV (search_query, category_id, min_price).
        #[arg(long)]
        parts: Option<PathBuf>,

        /// Bid multiplier applied to summed part values.
        #[arg(long)]
        multiplier: Option<f64>,

        /// Statistical pricing only, even when a language model is configured.
        #[arg(long, default_value_t = false)]
        no_ai: bool,

        /// Print the report as JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write the JSON report to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Price listings from a CSV file with columns part, title, price, shipping.
    Analyze {
        listings: PathBuf,

        /// Parts list CSV used for category and minimum price.
        #[arg(long)]
        parts: Option<PathBuf>,

        /// Vehicle context for AI pricing, e.g. "2012 Ford F-150".
        #[arg(long)]
        vehicle: Option<String>,

        #[arg(long)]
        multiplier: Option<f64>,

        #[arg(long, default_value_t = false)]
        no_ai: bool,

        #[arg(long, default_value_t = false)]
        json: bool,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Recompute totals and bids from a saved results file.
    Summarize {
        results: PathBuf,

        #[arg(long)]
        multiplier: Option<f64>,
    },
    /// Manage free-text instructions embedded in AI pricing prompts.
    Instructions {
        #[command(subcommand)]
        action: InstructionsAction,
    },
    /// Show the parts list in effect.
    Parts {
        #[arg(long)]
        parts: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum InstructionsAction {
    /// Print the current instructions.
    Show,
    /// Replace the instructions with TEXT, or with the contents of --file.
    Set {
        text: Option<String>,

        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Remove the instructions.
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Bid {
            vin,
            parts,
            multiplier,
            no_ai,
            json,
            output,
        } => run_bid(&config, &vin, parts, multiplier, no_ai, json, output),
        Commands::Analyze {
            listings,
            parts,
            vehicle,
            multiplier,
            no_ai,
            json,
            output,
        } => run_analyze(
            &config, &listings, parts, vehicle, multiplier, no_ai, json, output,
        ),
        Commands::Summarize {
            results,
            multiplier,
        } => run_summarize(&config, &results, multiplier),
        Commands::Instructions { action } => run_instructions(&config, action),
        Commands::Parts { parts } => run_parts(&config, parts),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info,salvage_core=info",
        1 => "info,salvage_core=debug",
        _ => "debug,salvage_core=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_analyzer(
    config: &AppConfig,
    credentials: &Credentials,
    no_ai: bool,
) -> Result<AiPricingAnalyzer> {
    if no_ai || !config.ai.enabled {
        return Ok(AiPricingAnalyzer::disabled());
    }
    let model = build_language_model(&config.llm, credentials)?;
    match &model {
        Some(m) => info!(model = m.name(), "AI pricing enabled"),
        None => warn!(
            provider = ?config.llm.provider,
            "no API key for the configured language model; using statistical pricing"
        ),
    }
    Ok(AiPricingAnalyzer::from_parts(model, config.ai.clone()))
}

fn load_instructions(config: &AppConfig) -> Result<Option<String>> {
    let store = FileInstructionStore::new(&config.paths.instructions_file);
    Ok(store.load()?)
}

fn emit_report(
    config: &AppConfig,
    report: &RunReport,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    if json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print!("{}", report::render_report(report));
    }

    if let Some(path) = output.or_else(|| config.paths.results_file.clone()) {
        std::fs::write(&path, report.to_json_pretty()?)
            .with_context(|| format!("writing {}", path.display()))?;
        if !json {
            println!("Report saved to: {}", path.display());
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_bid(
    config: &AppConfig,
    vin: &str,
    parts_path: Option<PathBuf>,
    multiplier: Option<f64>,
    no_ai: bool,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    // Re-read .env so edits made since the last run take precedence.
    let mut credentials = Credentials::default();
    credentials.reload();

    // Credentials are checked before any network call.
    let source = EbayClient::from_credentials(&credentials, config.marketplace.clone())?;
    let decoder = NhtsaDecoder::new()?;
    let analyzer = build_analyzer(config, &credentials, no_ai)?;

    let parts = load_parts_or_default(parts_path.as_deref().unwrap_or(&config.paths.parts_file));
    let options = RunOptions {
        multiplier: multiplier.unwrap_or(config.bid.multiplier),
        instructions: load_instructions(config)?,
    };

    let progress: &dyn RunProgress = if json { &SilentProgress } else { &StdoutProgress };
    let deps = Collaborators {
        decoder: &decoder,
        source: &source,
        analyzer: &analyzer,
    };
    let report = salvage_core::run_vehicle(vin, &parts, deps, &options, progress)?;

    emit_report(config, &report, json, output)
}

/// One row of an offline listings file.
#[derive(Debug, Deserialize)]
struct ListingRow {
    part: String,
    title: String,
    price: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    shipping: Option<f64>,
}

/// Group listing rows by part, in order of first appearance.
fn read_listings(path: &Path, known: &[PartQuery]) -> Result<Vec<PartListings>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut groups: Vec<PartListings> = Vec::new();
    for (line, row) in rdr.deserialize::<ListingRow>().enumerate() {
        let row = row.with_context(|| format!("{}: row {}", path.display(), line + 2))?;
        let shipping = row.shipping.unwrap_or(0.0);
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(row.price) || !valid(shipping) {
            bail!(
                "{}: row {}: price and shipping must be non-negative",
                path.display(),
                line + 2
            );
        }
        let listing = RawListing::new(row.title, row.price, shipping);

        match groups
            .iter_mut()
            .find(|g| g.part.name.eq_ignore_ascii_case(&row.part))
        {
            Some(group) => group.listings.push(listing),
            None => {
                let part = known
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(&row.part))
                    .cloned()
                    .unwrap_or_else(|| PartQuery::new(row.part.clone(), ""));
                groups.push(PartListings {
                    part,
                    listings: vec![listing],
                });
            }
        }
    }
    Ok(groups)
}

/// "2012 Ford F-150" → year, make, model.
fn parse_vehicle(text: &str) -> Result<VehicleInfo> {
    let mut words = text.split_whitespace();
    match (words.next(), words.next()) {
        (Some(year), Some(make)) => {
            let model = words.collect::<Vec<_>>().join(" ");
            if model.is_empty() {
                bail!("--vehicle needs year, make and model, got '{text}'");
            }
            Ok(VehicleInfo::new(year, make, model))
        }
        _ => bail!("--vehicle needs year, make and model, got '{text}'"),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    config: &AppConfig,
    listings_path: &Path,
    parts_path: Option<PathBuf>,
    vehicle: Option<String>,
    multiplier: Option<f64>,
    no_ai: bool,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let known = load_parts_or_default(parts_path.as_deref().unwrap_or(&config.paths.parts_file));
    let inputs = read_listings(listings_path, &known)?;
    if inputs.is_empty() {
        bail!("{} contains no listings", listings_path.display());
    }

    let vehicle = vehicle.as_deref().map(parse_vehicle).transpose()?;
    let credentials = Credentials::from_env();
    let analyzer = build_analyzer(config, &credentials, no_ai)?;
    let instructions = load_instructions(config)?;

    let parts = analyze_all(&inputs, vehicle.as_ref(), instructions.as_deref(), &analyzer);
    let report = RunReport::new(
        None,
        vehicle,
        parts,
        Vec::new(),
        multiplier.unwrap_or(config.bid.multiplier),
    );

    emit_report(config, &report, json, output)
}

fn run_summarize(config: &AppConfig, path: &Path, multiplier: Option<f64>) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let results = load_results_map(&content)
        .with_context(|| format!("{} is neither a report nor a results map", path.display()))?;

    let aggregator = BidAggregator::new(multiplier.unwrap_or(config.bid.multiplier));
    let summary = aggregator.aggregate(results.values());
    print!("{}", report::render_summary(&results, &summary));
    Ok(())
}

fn run_instructions(config: &AppConfig, action: InstructionsAction) -> Result<()> {
    let store = FileInstructionStore::new(&config.paths.instructions_file);
    match action {
        InstructionsAction::Show => match store.load()? {
            Some(text) => print!("{text}"),
            None => println!("No instructions set ({}).", store.path().display()),
        },
        InstructionsAction::Set { text, file } => {
            let text = match (text, file) {
                (Some(_), Some(_)) => bail!("give TEXT or --file, not both"),
                (Some(t), None) => t,
                (None, Some(f)) => std::fs::read_to_string(&f)
                    .with_context(|| format!("reading {}", f.display()))?,
                (None, None) => bail!("one of TEXT or --file is required"),
            };
            store.save(&text)?;
            println!("Instructions saved to {}", store.path().display());
        }
        InstructionsAction::Clear => {
            store.clear()?;
            println!("Instructions cleared.");
        }
    }
    Ok(())
}

fn run_parts(config: &AppConfig, parts_path: Option<PathBuf>) -> Result<()> {
    let path = parts_path.unwrap_or_else(|| config.paths.parts_file.clone());
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "built-in defaults".to_string()
    };
    let parts = load_parts_or_default(&path);
    print!("{}", report::render_parts(&parts, &source));
    Ok(())
}
