//! VIN validation and the NHTSA vPIC decoder.
//!
//! The vPIC `decodevin` endpoint returns a flat list of `{Variable, Value}`
//! pairs. Year, make and model are required; an attempt whose response lacks
//! any of them counts as a failed attempt. Attempts use escalating timeouts
//! (15 s, 25 s, 35 s).

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::VehicleInfo;

use super::provider::{VinDecoder, VinError};

const DEFAULT_BASE_URL: &str = "https://vpic.nhtsa.dot.gov/api/vehicles";

/// A 17-character, upper-cased vehicle identification number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Vin(String);

impl Vin {
    pub const LEN: usize = 17;

    /// Trim and upper-case, then require exactly 17 alphanumeric characters.
    pub fn parse(input: &str) -> Result<Self, VinError> {
        let vin = input.trim().to_uppercase();
        let invalid = |reason: String| VinError::Invalid {
            vin: vin.clone(),
            reason,
        };

        let len = vin.chars().count();
        if len != Self::LEN {
            return Err(invalid(format!(
                "expected {} characters, got {len}",
                Self::LEN
            )));
        }
        if let Some(c) = vin.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(invalid(format!("unexpected character '{c}'")));
        }
        Ok(Self(vin))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Vin {
    type Err = VinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct DecodeResponse {
    #[serde(rename = "Results", default)]
    results: Vec<DecodeVariable>,
}

#[derive(Debug, Deserialize)]
struct DecodeVariable {
    #[serde(rename = "Variable")]
    variable: String,
    #[serde(rename = "Value")]
    value: Option<String>,
}

fn meaningful(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("not applicable") {
        None
    } else {
        Some(v.to_string())
    }
}

/// "5.0L 8-cyl" from displacement and cylinder count, whichever are known.
fn engine_description(displacement: Option<String>, cylinders: Option<String>) -> Option<String> {
    let displacement = displacement.map(|d| match d.parse::<f64>() {
        Ok(litres) => format!("{litres:.1}L"),
        Err(_) => d,
    });
    let cylinders = cylinders.map(|c| format!("{c}-cyl"));
    match (displacement, cylinders) {
        (Some(d), Some(c)) => Some(format!("{d} {c}")),
        (d, c) => d.or(c),
    }
}

/// Map a vPIC `decodevin` JSON body to vehicle attributes.
pub fn parse_decode_body(body: &str) -> Result<VehicleInfo, VinError> {
    let resp: DecodeResponse = serde_json::from_str(body)
        .map_err(|e| VinError::ResponseFormatChanged(format!("decodevin JSON: {e}")))?;

    let lookup = |name: &str| {
        resp.results
            .iter()
            .find(|r| r.variable == name)
            .and_then(|r| meaningful(r.value.as_deref()))
    };

    let year = lookup("Model Year").ok_or_else(|| VinError::Incomplete("Model Year".into()))?;
    let make = lookup("Make").ok_or_else(|| VinError::Incomplete("Make".into()))?;
    let model = lookup("Model").ok_or_else(|| VinError::Incomplete("Model".into()))?;

    Ok(VehicleInfo {
        year,
        make,
        model,
        trim: lookup("Trim"),
        engine: engine_description(
            lookup("Displacement (L)"),
            lookup("Engine Number of Cylinders"),
        ),
        drive_type: lookup("Drive Type"),
        fuel_type: lookup("Fuel Type - Primary"),
        body_class: lookup("Body Class"),
    })
}

/// NHTSA vPIC VIN decoder.
pub struct NhtsaDecoder {
    http: reqwest::blocking::Client,
    base_url: String,
    timeouts: Vec<Duration>,
}

impl NhtsaDecoder {
    pub fn new() -> Result<Self, VinError> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| VinError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeouts: [15, 25, 35].into_iter().map(Duration::from_secs).collect(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// One timeout per attempt.
    pub fn with_timeouts(mut self, timeouts: Vec<Duration>) -> Self {
        if !timeouts.is_empty() {
            self.timeouts = timeouts;
        }
        self
    }

    fn decode_url(&self, vin: &Vin) -> String {
        format!("{}/decodevin/{}?format=json", self.base_url, vin)
    }

    fn attempt(&self, vin: &Vin, timeout: Duration) -> Result<VehicleInfo, VinError> {
        let resp = self
            .http
            .get(self.decode_url(vin))
            .timeout(timeout)
            .send()
            .map_err(|e| VinError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VinError::Http(status.as_u16()));
        }

        let body = resp.text().map_err(|e| VinError::Network(e.to_string()))?;
        parse_decode_body(&body)
    }
}

impl VinDecoder for NhtsaDecoder {
    fn name(&self) -> &str {
        "nhtsa-vpic"
    }

    fn decode(&self, vin: &Vin) -> Result<VehicleInfo, VinError> {
        let attempts = self.timeouts.len();
        let mut last_error = None;

        for (i, &timeout) in self.timeouts.iter().enumerate() {
            debug!(%vin, attempt = i + 1, timeout_secs = timeout.as_secs(), "decoding VIN");
            match self.attempt(vin, timeout) {
                Ok(vehicle) => {
                    info!(%vin, vehicle = %vehicle.describe(), "VIN decoded");
                    return Ok(vehicle);
                }
                Err(e) => {
                    warn!(%vin, attempt = i + 1, attempts, error = %e, "VIN decode attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(VinError::Exhausted {
            attempts,
            last: Box::new(
                last_error.unwrap_or_else(|| VinError::Network("no attempts made".into())),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F150: &str = r#"{"Count": 136, "Results": [
        {"Value": "FORD", "ValueId": "460", "Variable": "Make", "VariableId": 26},
        {"Value": "F-150", "ValueId": "1801", "Variable": "Model", "VariableId": 28},
        {"Value": "2012", "ValueId": "", "Variable": "Model Year", "VariableId": 29},
        {"Value": "XLT", "ValueId": "", "Variable": "Trim", "VariableId": 38},
        {"Value": "4.951882560000", "ValueId": "", "Variable": "Displacement (L)", "VariableId": 13},
        {"Value": "8", "ValueId": "", "Variable": "Engine Number of Cylinders", "VariableId": 9},
        {"Value": "4WD/4-Wheel Drive/4x4", "ValueId": "", "Variable": "Drive Type", "VariableId": 15},
        {"Value": "Gasoline", "ValueId": "", "Variable": "Fuel Type - Primary", "VariableId": 24},
        {"Value": null, "ValueId": "", "Variable": "Body Class", "VariableId": 5}
    ]}"#;

    #[test]
    fn parse_normalizes_and_validates_length() {
        let vin = Vin::parse("  1ftfw1et5cfa12345 ").unwrap();
        assert_eq!(vin.as_str(), "1FTFW1ET5CFA12345");

        assert!(matches!(Vin::parse("1FTFW1ET5"), Err(VinError::Invalid { .. })));
        assert!(matches!(
            Vin::parse("1FTFW1ET5CFA1234-"),
            Err(VinError::Invalid { .. })
        ));
    }

    #[test]
    fn decode_body_maps_variables() {
        let v = parse_decode_body(F150).unwrap();
        assert_eq!(v.describe(), "2012 FORD F-150");
        assert_eq!(v.trim.as_deref(), Some("XLT"));
        assert_eq!(v.engine.as_deref(), Some("5.0L 8-cyl"));
        assert_eq!(v.drive_type.as_deref(), Some("4WD/4-Wheel Drive/4x4"));
        assert_eq!(v.body_class, None);
    }

    #[test]
    fn missing_required_field_is_incomplete() {
        let body = r#"{"Results": [
            {"Value": "FORD", "Variable": "Make"},
            {"Value": "", "Variable": "Model"},
            {"Value": "2012", "Variable": "Model Year"}
        ]}"#;
        match parse_decode_body(body) {
            Err(VinError::Incomplete(field)) => assert_eq!(field, "Model"),
            other => panic!("expected Incomplete, got {other:?}"),
        }
    }

    #[test]
    fn garbage_body_is_format_error() {
        assert!(matches!(
            parse_decode_body("<html>"),
            Err(VinError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn engine_description_partial() {
        assert_eq!(engine_description(None, Some("4".into())).as_deref(), Some("4-cyl"));
        assert_eq!(engine_description(Some("2.5".into()), None).as_deref(), Some("2.5L"));
        assert_eq!(engine_description(None, None), None);
    }

    #[test]
    fn default_timeouts_escalate() {
        let decoder = NhtsaDecoder::new().unwrap();
        assert_eq!(
            decoder.timeouts,
            vec![
                Duration::from_secs(15),
                Duration::from_secs(25),
                Duration::from_secs(35)
            ]
        );
        let vin = Vin::parse("1FTFW1ET5CFA12345").unwrap();
        assert_eq!(
            decoder.decode_url(&vin),
            "https://vpic.nhtsa.dot.gov/api/vehicles/decodevin/1FTFW1ET5CFA12345?format=json"
        );
    }
}
