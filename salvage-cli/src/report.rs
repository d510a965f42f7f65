//! Text rendering for reports, summaries and the parts list.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use salvage_core::run::PartReport;
use salvage_core::{PartPrices, PartQuery, RunReport, TierTotals, VehicleBidSummary};

fn money(v: f64) -> String {
    format!("${v:.2}")
}

fn tiers_line(label: &str, t: &TierTotals) -> String {
    format!(
        "{label:<16} low {:>12}   average {:>12}   high {:>12}\n",
        money(t.low),
        money(t.average),
        money(t.high)
    )
}

fn bid_block(summary: &VehicleBidSummary) -> String {
    let mut out = String::new();
    out.push_str(&tiers_line("Parts total:", &summary.totals));
    out.push_str(&tiers_line(
        &format!("Bid ({:.0}%):", summary.multiplier * 100.0),
        &summary.bids,
    ));
    out
}

fn part_row(out: &mut String, p: &PartReport) {
    let a = &p.outcome.analysis;
    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>6} {:>8} {:>11} {:>11} {:>11}  {}",
        p.part.name,
        p.listings_found,
        a.items_considered,
        a.items_removed,
        money(a.low),
        money(a.average),
        money(a.high),
        p.outcome.method.label()
    );
    if p.listings_found > 0 {
        let _ = writeln!(out, "  Listings hash: {}", p.dataset_hash.short());
    }
    if let Some(sample) = a.removal_samples.first() {
        let _ = writeln!(out, "  Sample removed: {sample}");
    }
    if a.price_range > 0.0 {
        let _ = writeln!(out, "  Cleaned range: {}", money(a.price_range));
    }
    if let Some(rationale) = &a.rationale {
        let _ = writeln!(out, "  Rationale: {rationale}");
    }
    if let Some(err) = &p.error {
        let _ = writeln!(out, "  Error: {err}");
    }
}

pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("=== Salvage Bid Report ===\n");
    if let Some(v) = &report.vehicle {
        let mut line = v.describe();
        if let Some(trim) = &v.trim {
            line.push(' ');
            line.push_str(trim);
        }
        let _ = writeln!(out, "Vehicle:   {line}");
        if let Some(engine) = &v.engine {
            let _ = writeln!(out, "Engine:    {engine}");
        }
    }
    if let Some(vin) = &report.vin {
        let _ = writeln!(out, "VIN:       {vin}");
    }
    let _ = writeln!(
        out,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<16} {:>8} {:>6} {:>8} {:>11} {:>11} {:>11}  Method",
        "Part", "Listings", "Kept", "Removed", "Low", "Average", "High"
    );
    out.push_str(&"-".repeat(90));
    out.push('\n');
    for p in &report.parts {
        part_row(&mut out, p);
    }
    out.push('\n');
    out.push_str(&bid_block(&report.summary));

    let failed = report.failed_parts();
    if !failed.is_empty() {
        let _ = writeln!(out, "\nFAILED PARTS: {}", failed.join(", "));
    }
    if !report.diagnostics.is_empty() {
        out.push_str("\nDiagnostics:\n");
        for d in &report.diagnostics {
            let _ = writeln!(out, "  - {d}");
        }
    }
    out.push('\n');
    out
}

pub fn render_summary(
    results: &BTreeMap<String, PartPrices>,
    summary: &VehicleBidSummary,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>11} {:>11} {:>11}",
        "Part", "Low", "Average", "High"
    );
    out.push_str(&"-".repeat(52));
    out.push('\n');
    for (name, prices) in results {
        let t = prices.tiers();
        let legacy = matches!(prices, PartPrices::Scalar(_));
        let _ = writeln!(
            out,
            "{:<16} {:>11} {:>11} {:>11}{}",
            name,
            money(t.low),
            money(t.average),
            money(t.high),
            if legacy { "  (single value)" } else { "" }
        );
    }
    out.push('\n');
    out.push_str(&bid_block(summary));

    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, p)| p.is_zero())
        .map(|(name, _)| name.as_str())
        .collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "\nFAILED PARTS: {}", failed.join(", "));
    }
    out
}

pub fn render_parts(parts: &[PartQuery], source: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Parts list: {source}");
    let _ = writeln!(out, "{:<20} {:<10} {:>10}", "Search query", "Category", "Minimum");
    out.push_str(&"-".repeat(42));
    out.push('\n');
    for p in parts {
        let minimum = if p.minimum_price > 0.0 {
            money(p.minimum_price)
        } else {
            "-".to_string()
        };
        let _ = writeln!(out, "{:<20} {:<10} {:>10}", p.name, p.category_id, minimum);
    }
    out
}
