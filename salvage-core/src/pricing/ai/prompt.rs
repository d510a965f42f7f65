//! Prompt construction for model-backed pricing.

use std::fmt::Write as _;

use crate::domain::{PartQuery, RawListing, VehicleInfo};

use super::super::analyzer::PricingRequest;

/// Titles longer than this are cut in the listing table.
pub const MAX_TITLE_CHARS: usize = 80;

pub const SYSTEM_PROMPT: &str = "You are a used auto parts pricing analyst for a salvage \
yard. You estimate what a buyer should expect to pay for a used part from marketplace \
listings. You reply with a single JSON object and nothing else.";

/// Strip control characters and `|`, collapse whitespace, cap the length.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c.is_control() || c == '|' { ' ' } else { c })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_TITLE_CHARS).collect()
}

/// One row per listing: `price | shipping | total | title`.
pub fn listing_table(listings: &[RawListing]) -> String {
    let mut out = String::from("price | shipping | total | title\n");
    for listing in listings {
        let _ = writeln!(
            out,
            "{:.2} | {:.2} | {:.2} | {}",
            listing.price,
            listing.shipping,
            listing.total(),
            sanitize_title(&listing.title)
        );
    }
    out
}

/// Hints about which listings fit, derived from drivetrain and fuel type.
pub fn fitment_hints(vehicle: &VehicleInfo) -> Vec<String> {
    let mut hints = Vec::new();

    if let Some(drive) = vehicle.drive_type.as_deref() {
        let d = drive.to_uppercase();
        if d.contains("AWD") || d.contains("ALL-WHEEL") || d.contains("ALL WHEEL") {
            hints.push("Vehicle is AWD: prefer AWD parts, exclude FWD/RWD-only units.".to_string());
        } else if d.contains("4WD") || d.contains("4X4") || d.contains("4-WHEEL") {
            hints.push("Vehicle is 4WD: prefer 4WD/4x4 parts, exclude 2WD-only units.".to_string());
        } else if d.contains("FWD") || d.contains("FRONT") {
            hints.push("Vehicle is FWD: exclude AWD/4WD/RWD-only units.".to_string());
        } else if d.contains("RWD") || d.contains("REAR") {
            hints.push("Vehicle is RWD: exclude FWD and AWD/4WD-only units.".to_string());
        }
    }

    if let Some(fuel) = vehicle.fuel_type.as_deref() {
        let f = fuel.to_lowercase();
        if f.contains("diesel") {
            hints.push("Vehicle is diesel: exclude gasoline engine parts.".to_string());
        } else if f.contains("electric") && !f.contains("hybrid") {
            hints.push(
                "Vehicle is electric: exclude combustion engine and transmission parts."
                    .to_string(),
            );
        }
        if f.contains("hybrid") {
            hints.push("Vehicle is a hybrid: prefer hybrid-specific parts.".to_string());
        }
    }

    hints
}

fn vehicle_section(vehicle: &VehicleInfo) -> String {
    let mut out = String::from("Vehicle:\n");
    let _ = writeln!(out, "- Year: {}", vehicle.year);
    let _ = writeln!(out, "- Make: {}", vehicle.make);
    let _ = writeln!(out, "- Model: {}", vehicle.model);
    let optional = [
        ("Trim", &vehicle.trim),
        ("Engine", &vehicle.engine),
        ("Drivetrain", &vehicle.drive_type),
        ("Fuel", &vehicle.fuel_type),
        ("Body", &vehicle.body_class),
    ];
    for (label, value) in optional {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            let _ = writeln!(out, "- {label}: {v}");
        }
    }
    out
}

fn minimum_price_line(part: &PartQuery) -> String {
    if part.minimum_price > 0.0 {
        format!(
            "Exclude any listing whose total is below ${:.2}; these are accessories or \
             fragments, not the part itself.",
            part.minimum_price
        )
    } else {
        "No minimum price applies to this part.".to_string()
    }
}

const ROUNDING_RULES: &str = "\
Pricing convention:
- low = 10th percentile, average = 30th percentile, high = 50th percentile of the \
listings you keep (with fewer than 10 kept: 5th/25th/50th).
- Round with 10+ kept: under $100 to $5, under $500 to $10, otherwise $25. \
With fewer than 10 kept: under $50 to $1, under $200 to $5, otherwise $10.
- Require low <= average <= high.";

const RESPONSE_SCHEMA: &str = r#"Respond with exactly this JSON object and no other keys:
{
  "low_price": <number>,
  "average_price": <number>,
  "high_price": <number>,
  "items_analyzed": <integer, listings kept>,
  "items_filtered_out": <integer, listings excluded>,
  "reasoning": "<one or two sentences>"
}"#;

/// Full user prompt for one part.
pub fn build_prompt(request: &PricingRequest<'_>) -> String {
    let part = request.part;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Estimate used prices for part: {} ({} listings).\n",
        part.name,
        request.listings.len()
    );
    out.push_str(&listing_table(request.listings));
    out.push('\n');

    out.push_str(
        "Exclude listings that are miscategorized (gaskets, sensors, brackets, \
         rebuild kits and similar accessories listed under the part), damaged, \
         or for a different vehicle.\n",
    );
    out.push_str(&minimum_price_line(part));
    out.push_str("\n\n");

    if let Some(vehicle) = request.vehicle {
        out.push_str(&vehicle_section(vehicle));
        let hints = fitment_hints(vehicle);
        if !hints.is_empty() {
            out.push_str("Fitment:\n");
            for hint in hints {
                let _ = writeln!(out, "- {hint}");
            }
        }
        out.push('\n');
    }

    out.push_str(ROUNDING_RULES);
    out.push_str("\n\n");
    out.push_str(RESPONSE_SCHEMA);
    out.push('\n');

    if let Some(extra) = request.instructions.filter(|s| !s.trim().is_empty()) {
        out.push_str("\nAdditional instructions from the user:\n");
        out.push_str(extra);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_pipes_and_controls() {
        assert_eq!(
            sanitize_title("OEM | engine\t\n 5.0L   V8"),
            "OEM engine 5.0L V8"
        );
    }

    #[test]
    fn sanitize_truncates() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_title(&long).chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn table_rows() {
        let table = listing_table(&[RawListing::new("Engine | 5.0", 900.0, 100.0)]);
        assert!(table.contains("900.00 | 100.00 | 1000.00 | Engine 5.0"));
    }

    #[test]
    fn minimum_price_is_stated_either_way() {
        let listings = [RawListing::new("a", 1.0, 0.0)];
        let with_min = PartQuery::new("engine", "33615").with_minimum_price(200.0);
        let prompt = build_prompt(&PricingRequest::new(&with_min, &listings));
        assert!(prompt.contains("below $200.00"));

        let without = PartQuery::new("engine", "33615");
        let prompt = build_prompt(&PricingRequest::new(&without, &listings));
        assert!(prompt.contains("No minimum price applies"));
    }

    #[test]
    fn vehicle_fields_only_when_present() {
        let part = PartQuery::new("transmission", "33616");
        let mut vehicle = VehicleInfo::new("2015", "Subaru", "Outback");
        vehicle.drive_type = Some("AWD/All-Wheel Drive".into());
        let prompt = build_prompt(&PricingRequest::new(&part, &[]).with_vehicle(&vehicle));
        assert!(prompt.contains("- Make: Subaru"));
        assert!(prompt.contains("- Drivetrain: AWD/All-Wheel Drive"));
        assert!(!prompt.contains("- Trim:"));
        assert!(prompt.contains("Vehicle is AWD"));
    }

    #[test]
    fn fuel_hints() {
        let mut v = VehicleInfo::new("2020", "Toyota", "Prius");
        v.fuel_type = Some("Gasoline".into());
        assert!(fitment_hints(&v).is_empty());
        v.fuel_type = Some("Hybrid".into());
        assert_eq!(fitment_hints(&v).len(), 1);
        v.fuel_type = Some("Diesel".into());
        assert!(fitment_hints(&v)[0].contains("diesel"));
    }

    #[test]
    fn instructions_verbatim_unless_blank() {
        let part = PartQuery::new("alternator", "33555");
        let req = PricingRequest::new(&part, &[]).with_instructions("Ignore remanufactured units.");
        assert!(build_prompt(&req).ends_with("Ignore remanufactured units.\n"));

        let blank = PricingRequest::new(&part, &[]).with_instructions("   \n");
        assert!(!build_prompt(&blank).contains("Additional instructions"));
    }
}
