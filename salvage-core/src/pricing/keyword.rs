//! Keyword filter: drops listings whose title names a sub-component.
//!
//! A search for "engine" returns gaskets, sensors and brackets alongside whole
//! engines. The dictionary below lists, per part, the title fragments that
//! mark a listing as miscategorized. Unknown parts are never filtered.

use super::filter::{dollars, ListingFilter, PricedItem, RemovalLog};

/// Suspicious title fragments keyed by lowercased part name.
pub const SUSPICIOUS_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "engine",
        &[
            "oil filter",
            "housing",
            "gasket",
            "seal",
            "sensor",
            "valve cover",
            "dipstick",
            "bracket",
            "mount",
            "belt",
            "pulley",
        ],
    ),
    (
        "alternator",
        &["brush", "pulley", "wire", "connector", "regulator", "belt"],
    ),
    (
        "transmission",
        &["fluid", "filter", "gasket", "cooler", "mount", "line"],
    ),
    ("starter", &["solenoid", "brush", "drive", "gear", "bolt"]),
    (
        "brake caliper",
        &["pad", "rotor", "disc", "fluid", "line", "hose"],
    ),
    (
        "fuel pump",
        &["filter", "line", "hose", "tank", "sending unit"],
    ),
    (
        "headlight",
        &["bulb", "ballast", "wire", "connector", "lens", "cover"],
    ),
];

/// Keywords for a part name (case-insensitive); empty for unknown parts.
pub fn suspicious_keywords(part_name: &str) -> &'static [&'static str] {
    let key = part_name.to_lowercase();
    SUSPICIOUS_KEYWORDS
        .iter()
        .find(|(part, _)| *part == key)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// Drops items whose title contains any keyword for the part.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: &'static [&'static str],
}

impl KeywordFilter {
    pub fn for_part(part_name: &str) -> Self {
        Self {
            keywords: suspicious_keywords(part_name),
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        self.keywords
    }

    pub fn is_suspicious(&self, title: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let title = title.to_lowercase();
        self.keywords.iter().any(|keyword| title.contains(keyword))
    }
}

impl ListingFilter for KeywordFilter {
    fn name(&self) -> &str {
        "keyword"
    }

    fn apply(&self, items: Vec<PricedItem>, log: &mut RemovalLog) -> Vec<PricedItem> {
        items
            .into_iter()
            .filter(|item| {
                if self.is_suspicious(&item.title) {
                    log.record(format!(
                        "{} - Miscategorized (contains suspicious keywords)",
                        dollars(item.total)
                    ));
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}
