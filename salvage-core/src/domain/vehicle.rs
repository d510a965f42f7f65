use serde::{Deserialize, Serialize};

/// Decoded vehicle attributes.
///
/// Year, make and model are always present; the rest depend on how much the
/// VIN decoder knows about the vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub year: String,
    pub make: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_class: Option<String>,
}

impl VehicleInfo {
    pub fn new(year: impl Into<String>, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            make: make.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// "2012 Ford F-150"
    pub fn describe(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    /// Last two digits of the model year ("12" for 2012).
    pub fn short_year(&self) -> &str {
        let year = self.year.trim();
        let start = year.len().saturating_sub(2);
        year.get(start..).unwrap_or(year)
    }
}
