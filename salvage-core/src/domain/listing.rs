use serde::{Deserialize, Serialize};

/// A single marketplace listing as fetched, before any cleaning.
///
/// `item_id` is only used by the marketplace client to de-duplicate results
/// across search queries; the pricing engine never looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub shipping: f64,
}

impl RawListing {
    pub fn new(title: impl Into<String>, price: f64, shipping: f64) -> Self {
        Self {
            item_id: None,
            title: title.into(),
            price,
            shipping,
        }
    }

    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Delivered price: item price plus shipping.
    pub fn total(&self) -> f64 {
        self.price + self.shipping
    }
}
