//! Parsing and validation of the model's JSON reply.

use serde::Deserialize;
use tracing::warn;

use crate::domain::PriceAnalysis;

/// The only shape accepted from the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiPriceResponse {
    pub low_price: f64,
    pub average_price: f64,
    pub high_price: f64,
    pub items_analyzed: usize,
    pub items_filtered_out: usize,
    pub reasoning: String,
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
///
/// The fence may span lines or sit on one line, with or without an info
/// string.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // A JSON body starts with `{` or `[`, so any leading word is the info string.
    let body = rest
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        .trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse and validate a reply into an analysis.
///
/// Errors are human-readable reasons suitable for `PricingMethod::Fallback`.
pub fn parse_response(text: &str) -> Result<PriceAnalysis, String> {
    let body = strip_code_fence(text);
    let parsed: AiPriceResponse =
        serde_json::from_str(body).map_err(|e| format!("invalid response JSON: {e}"))?;

    for (field, value) in [
        ("low_price", parsed.low_price),
        ("average_price", parsed.average_price),
        ("high_price", parsed.high_price),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{field} must be a finite non-negative number, got {value}"));
        }
    }

    let mut prices = [parsed.low_price, parsed.average_price, parsed.high_price];
    if !(prices[0] <= prices[1] && prices[1] <= prices[2]) {
        warn!(
            low = prices[0],
            average = prices[1],
            high = prices[2],
            "model returned unordered tiers; sorting"
        );
        prices.sort_by(f64::total_cmp);
    }

    Ok(PriceAnalysis {
        low: prices[0],
        average: prices[1],
        high: prices[2],
        items_considered: parsed.items_analyzed,
        items_removed: parsed.items_filtered_out,
        removal_samples: Vec::new(),
        rationale: Some(parsed.reasoning),
        price_range: 0.0,
        raw_percentiles: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"{"low_price": 850, "average_price": 1000, "high_price": 1250,
        "items_analyzed": 14, "items_filtered_out": 6, "reasoning": "Dropped gasket kits."}"#;

    #[test]
    fn parses_valid_reply() {
        let a = parse_response(GOOD).unwrap();
        assert_eq!((a.low, a.average, a.high), (850.0, 1000.0, 1250.0));
        assert_eq!(a.items_considered, 14);
        assert_eq!(a.items_removed, 6);
        assert_eq!(a.rationale.as_deref(), Some("Dropped gasket kits."));
    }

    #[test]
    fn strips_code_fences() {
        let fenced = format!("```json\n{GOOD}\n```");
        assert!(parse_response(&fenced).is_ok());
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn strips_single_line_fences() {
        let one_line = format!("```json {} ```", GOOD.replace('\n', " "));
        let a = parse_response(&one_line).unwrap();
        assert_eq!((a.low, a.average, a.high), (850.0, 1000.0, 1250.0));

        assert_eq!(strip_code_fence("```{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```JSON\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```json {}"), "{}");
    }

    #[test]
    fn rejects_extra_keys() {
        let extra = r#"{"low_price": 1, "average_price": 2, "high_price": 3,
            "items_analyzed": 1, "items_filtered_out": 0, "reasoning": "", "confidence": 0.9}"#;
        let err = parse_response(extra).unwrap_err();
        assert!(err.contains("confidence"), "got {err}");
    }

    #[test]
    fn rejects_missing_keys() {
        let missing = r#"{"low_price": 1, "average_price": 2, "high_price": 3}"#;
        assert!(parse_response(missing).is_err());
    }

    #[test]
    fn rejects_negative_price_and_counts() {
        let negative = r#"{"low_price": -5, "average_price": 2, "high_price": 3,
            "items_analyzed": 1, "items_filtered_out": 0, "reasoning": ""}"#;
        assert!(parse_response(negative).is_err());

        let negative_count = r#"{"low_price": 1, "average_price": 2, "high_price": 3,
            "items_analyzed": -1, "items_filtered_out": 0, "reasoning": ""}"#;
        assert!(parse_response(negative_count).is_err());
    }

    #[test]
    fn unordered_tiers_are_sorted_without_rounding() {
        let unordered = r#"{"low_price": 1200, "average_price": 950.5, "high_price": 1100,
            "items_analyzed": 8, "items_filtered_out": 2, "reasoning": "x"}"#;
        let a = parse_response(unordered).unwrap();
        assert_eq!((a.low, a.average, a.high), (950.5, 1100.0, 1200.0));
    }

    #[test]
    fn prose_is_rejected() {
        assert!(parse_response("I think about $900.").is_err());
    }
}
