//! Parts list loading (`parts_list.csv`).
//!
//! Columns: `search_query`, `category_id`, optional `min_price`. Rows missing
//! either required column are skipped; a blank or malformed `min_price` reads
//! as 0. A missing or unreadable file falls back to the built-in list.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::ConfigError;
use crate::domain::{default_parts, PartQuery};

#[derive(Debug, Deserialize)]
struct PartRow {
    #[serde(default)]
    search_query: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    min_price: Option<f64>,
}

impl PartRow {
    fn into_query(self) -> Option<PartQuery> {
        let name = self.search_query.filter(|s| !s.trim().is_empty())?;
        let category = self.category_id.filter(|s| !s.trim().is_empty())?;
        let minimum = self
            .min_price
            .filter(|m| m.is_finite() && *m > 0.0)
            .unwrap_or(0.0);
        Some(PartQuery::new(name.trim(), category.trim()).with_minimum_price(minimum))
    }
}

/// Parse parts from CSV with a header row.
pub fn parse_parts<R: Read>(reader: R) -> Result<Vec<PartQuery>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut parts = Vec::new();
    for row in rdr.deserialize::<PartRow>() {
        match row?.into_query() {
            Some(part) => parts.push(part),
            None => debug!("skipping parts row without search_query/category_id"),
        }
    }
    Ok(parts)
}

/// Load the parts list from a file.
pub fn load_parts(path: &Path) -> Result<Vec<PartQuery>, ConfigError> {
    let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_parts(file).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the parts list, falling back to the built-in defaults.
///
/// The fallback also applies when the file has no usable rows.
pub fn load_parts_or_default(path: &Path) -> Vec<PartQuery> {
    match load_parts(path) {
        Ok(parts) if !parts.is_empty() => parts,
        Ok(_) => {
            warn!(path = %path.display(), "parts list has no usable rows; using defaults");
            default_parts()
        }
        Err(e) => {
            debug!(error = %e, "parts list unavailable; using defaults");
            default_parts()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_incomplete() {
        let csv = "search_query,category_id,min_price\n\
                   engine,33615,200\n\
                   ,33616,0\n\
                   headlight,33710,\n\
                   starter,,50\n\
                   fuel pump,33554,abc\n";
        let parts = parse_parts(csv.as_bytes()).unwrap();
        let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["engine", "headlight", "fuel pump"]);
        assert_eq!(parts[0].minimum_price, 200.0);
        assert_eq!(parts[1].minimum_price, 0.0);
        assert_eq!(parts[2].minimum_price, 0.0);
    }

    #[test]
    fn min_price_column_is_optional() {
        let csv = "search_query,category_id\nalternator,33555\n";
        let parts = parse_parts(csv.as_bytes()).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].category_id, "33555");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let parts = load_parts_or_default(Path::new("/nonexistent/parts_list.csv"));
        assert_eq!(parts, default_parts());
    }
}
