use serde::{Deserialize, Serialize};
use std::fmt;

use super::listing::RawListing;

/// Deterministic content hash of the listings a part was priced from.
///
/// Two runs that saw exactly the same listings (same order, same values)
/// produce the same hash, which makes re-runs comparable in saved reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn of_listings(listings: &[RawListing]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for listing in listings {
            // Fixed-width encoding of the numeric fields keeps the digest
            // independent of float formatting.
            hasher.update(&listing.price.to_le_bytes());
            hasher.update(&listing.shipping.to_le_bytes());
            hasher.update(listing.title.as_bytes());
            hasher.update(&[0]);
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let listings = vec![
            RawListing::new("engine", 900.0, 50.0),
            RawListing::new("engine assembly", 1200.0, 0.0),
        ];
        assert_eq!(
            DatasetHash::of_listings(&listings),
            DatasetHash::of_listings(&listings)
        );
    }

    #[test]
    fn hash_changes_with_price() {
        let a = vec![RawListing::new("engine", 900.0, 50.0)];
        let b = vec![RawListing::new("engine", 901.0, 50.0)];
        assert_ne!(DatasetHash::of_listings(&a), DatasetHash::of_listings(&b));
    }

    #[test]
    fn title_boundaries_are_unambiguous() {
        let a = vec![
            RawListing::new("ab", 1.0, 0.0),
            RawListing::new("c", 1.0, 0.0),
        ];
        let b = vec![
            RawListing::new("a", 1.0, 0.0),
            RawListing::new("bc", 1.0, 0.0),
        ];
        assert_ne!(DatasetHash::of_listings(&a), DatasetHash::of_listings(&b));
    }

    #[test]
    fn short_form_is_prefix() {
        let hash = DatasetHash::of_listings(&[]);
        assert_eq!(hash.short().len(), 12);
        assert!(hash.0.starts_with(hash.short()));
    }
}
