use serde::{Deserialize, Serialize};

/// One part category to price for every vehicle.
///
/// `name` doubles as the marketplace search keyword; its lowercase form is the
/// key into the suspicious-keyword dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartQuery {
    pub name: String,
    pub category_id: String,
    #[serde(default)]
    pub minimum_price: f64,
}

impl PartQuery {
    pub fn new(name: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category_id: category_id.into(),
            minimum_price: 0.0,
        }
    }

    pub fn with_minimum_price(mut self, minimum_price: f64) -> Self {
        self.minimum_price = minimum_price;
        self
    }
}

/// Built-in part list used when no parts file is available.
pub fn default_parts() -> Vec<PartQuery> {
    vec![
        PartQuery::new("engine", "33615"),
        PartQuery::new("transmission", "33616"),
        PartQuery::new("alternator", "33555"),
    ]
}
