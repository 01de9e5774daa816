//! Translation between live table sort entries and the backend `sortBy`
//! format, a JSON array of `[property, direction]` pairs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{OpenProjectError, Result};
use crate::filter::mapped_property;

/// A sort criterion on one property.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SortEntry {
    pub property: String,
    #[serde(default)]
    pub descending: bool,
}

impl SortEntry {
    pub fn new(property: impl Into<String>, descending: bool) -> Self {
        Self {
            property: property.into(),
            descending,
        }
    }

    fn direction(&self) -> &'static str {
        if self.descending {
            "desc"
        } else {
            "asc"
        }
    }
}

/// Converts sort entries into the backend format, in order.
pub fn convert_sorting(entries: &[SortEntry]) -> Result<String> {
    let pairs: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| json!([mapped_property(&entry.property), entry.direction()]))
        .collect();
    to_json(&pairs)
}

/// Merges live sort entries with a persisted `property:direction,...` string.
///
/// Live entries win: a stored pair is only appended when its property, after
/// renaming, is not already sorted on. Stored segments without a `:` are
/// skipped.
pub fn merge_sorting(entries: &[SortEntry], stored: &str) -> Result<String> {
    let mut merged: IndexMap<String, String> = IndexMap::new();
    for entry in entries {
        merged.insert(
            mapped_property(&entry.property).to_string(),
            entry.direction().to_string(),
        );
    }
    for pair in stored.split(',') {
        let Some((property, direction)) = pair.split_once(':') else {
            continue;
        };
        let property = mapped_property(property);
        if !merged.contains_key(property) {
            merged.insert(property.to_string(), direction.to_string());
        }
    }

    let pairs: Vec<serde_json::Value> = merged
        .iter()
        .map(|(property, direction)| json!([property, direction]))
        .collect();
    to_json(&pairs)
}

fn to_json(pairs: &[serde_json::Value]) -> Result<String> {
    serde_json::to_string(pairs).map_err(|source| OpenProjectError::Translation {
        what: "sort entries",
        source,
    })
}
