//! Translation between live table filters and the OpenProject filter format.
//!
//! The backend expects filters as a JSON array of one-key objects, for
//! example `[{"status":{"operator":"=","values":["1"]}}]`. Properties and
//! operators arriving from the table layer use its own vocabulary and are
//! mapped before serialization.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{OpenProjectError, Result};

/// Table properties that differ from the backend field names.
const PROPERTY_MAP: &[(&str, &str)] = &[
    ("date", "start_date"),
    ("identifier.value", "id"),
    ("summary.value", "subject"),
    ("assignees", "assigned_to"),
    ("creator.value", "author"),
    ("project.value", "project"),
    ("progress", "percentageDone"),
];

/// Table operators that differ from the backend operators.
const OPERATOR_MAP: &[(&str, &str)] = &[
    ("contains", "="),
    ("between", "<>d"),
    ("empty", "!*"),
];

/// Backend operators that are complete without any value.
const NO_VALUE_OPERATORS: &[&str] = &["t", "w", "*", "!*", "o", "c"];

/// Properties whose range values arrive as a single `low/high` string.
const DATE_PROPERTIES: &[&str] = &["startDate", "dueDate", "creationDate", "updateDate"];

/// A filter on one property, holding one or more constraints.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Filter {
    pub property: String,
    pub constraints: Vec<Constraint>,
}

/// One operator applied to a set of values.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Constraint {
    pub operator: String,
    pub values: Vec<String>,
}

impl Filter {
    /// A single-constraint filter.
    pub fn new(
        property: impl Into<String>,
        operator: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            property: property.into(),
            constraints: vec![Constraint::new(operator, values)],
        }
    }
}

impl Constraint {
    pub fn new(
        operator: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            operator: operator.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// A filter in the backend format, as persisted in a table configuration.
/// Accepts both the long field names and the abbreviated `n`/`o`/`v` form.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StoredFilter {
    #[serde(alias = "n")]
    pub property: String,
    #[serde(alias = "o")]
    pub operator: String,
    #[serde(alias = "v", default)]
    pub values: Vec<String>,
}

pub(crate) fn mapped_property(property: &str) -> &str {
    PROPERTY_MAP
        .iter()
        .find(|(from, _)| *from == property)
        .map_or(property, |(_, to)| to)
}

fn mapped_operator(operator: &str) -> &str {
    OPERATOR_MAP
        .iter()
        .find(|(from, _)| *from == operator)
        .map_or(operator, |(_, to)| to)
}

fn takes_no_value(operator: &str) -> bool {
    NO_VALUE_OPERATORS.contains(&operator)
}

/// Splits a `low/high` range value into its bounds. Only applies to date
/// properties; anything without a non-empty second part stays whole.
fn range_values(property: &str, value: &str) -> Vec<String> {
    if !DATE_PROPERTIES.contains(&property) {
        return vec![value.to_string()];
    }
    let mut parts = value.split('/');
    match (parts.next(), parts.next()) {
        (Some(low), Some(high)) if !high.is_empty() => {
            vec![low.to_string(), high.to_string()]
        }
        _ => vec![value.to_string()],
    }
}

fn filter_object(property: &str, operator: &str, values: &[String]) -> serde_json::Value {
    json!({ property: { "operator": operator, "values": values } })
}

fn to_json(what: &'static str, objects: &[serde_json::Value]) -> Result<String> {
    serde_json::to_string(objects)
        .map_err(|source| OpenProjectError::Translation { what, source })
}

/// Converts table filters into the backend filter format.
///
/// Each filter becomes one object. Its operator is taken from the first
/// constraint that survives value cleanup, and its values are all surviving
/// values across constraints. Blank values are dropped, and a constraint
/// without values only survives when its operator needs none. Filters with
/// no surviving constraint are omitted.
pub fn convert_filters(filters: &[Filter]) -> Result<String> {
    let mut objects = Vec::new();
    for filter in filters {
        let mut operator: Option<&str> = None;
        let mut values: Vec<String> = Vec::new();
        for constraint in &filter.constraints {
            let candidate = mapped_operator(&constraint.operator);
            let mut kept = Vec::new();
            for value in &constraint.values {
                if value.trim().is_empty() {
                    continue;
                }
                kept.extend(range_values(&filter.property, value));
            }
            if kept.is_empty() && !takes_no_value(candidate) {
                continue;
            }
            operator.get_or_insert(candidate);
            values.extend(kept);
        }
        if let Some(operator) = operator {
            objects.push(filter_object(mapped_property(&filter.property), operator, &values));
        }
    }
    to_json("filters", &objects)
}

/// Encodes filters that are already in the backend vocabulary, for example
/// persisted macro parameters. No renaming or value cleanup is applied; each
/// stored filter becomes one object as given.
pub fn convert_stored_filters(stored: &[StoredFilter]) -> Result<String> {
    let objects: Vec<serde_json::Value> = stored
        .iter()
        .map(|filter| filter_object(&filter.property, &filter.operator, &filter.values))
        .collect();
    to_json("filters", &objects)
}

/// Parses a persisted filter string. Blank input means no filters.
pub fn parse_stored_filters(stored: &str) -> Result<Vec<StoredFilter>> {
    if stored.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(stored).map_err(|source| OpenProjectError::Translation {
        what: "stored filters",
        source,
    })
}

/// Merges live table filters with a persisted filter string into one
/// backend filter array.
///
/// Live filters are converted first and grouped by property; a later filter
/// on an already-seen property replaces the earlier one. Stored filters are
/// then folded in without renaming: a new property is appended, a new
/// operator joins the property's groups, and values are appended to an
/// existing group unless already present.
pub fn merge_filters(filters: &[Filter], stored: &str) -> Result<String> {
    let mut merged: IndexMap<String, IndexMap<String, Vec<String>>> = IndexMap::new();

    for filter in filters {
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for constraint in &filter.constraints {
            let operator = mapped_operator(&constraint.operator);
            let mut kept = Vec::new();
            for value in &constraint.values {
                if value.trim().is_empty() {
                    continue;
                }
                kept.extend(range_values(&filter.property, value));
            }
            if kept.is_empty() && !takes_no_value(operator) {
                continue;
            }
            groups.entry(operator.to_string()).or_default().extend(kept);
        }
        if !groups.is_empty() {
            merged.insert(mapped_property(&filter.property).to_string(), groups);
        }
    }

    for filter in parse_stored_filters(stored)? {
        let groups = merged.entry(filter.property).or_default();
        let values = groups.entry(filter.operator).or_default();
        for value in filter.values {
            if !values.contains(&value) {
                values.push(value);
            }
        }
    }

    let mut objects = Vec::new();
    for (property, groups) in &merged {
        for (operator, values) in groups {
            objects.push(filter_object(property, operator, values));
        }
    }
    to_json("filters", &objects)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_no_filters() {
        assert_eq!(convert_filters(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_convert_drops_blank_values() {
        let filters = vec![Filter::new("status", "=", ["", "  "])];
        assert_eq!(convert_filters(&filters).unwrap(), "[]");
    }

    #[test]
    fn test_convert_status_filter() {
        let filters = vec![Filter::new("status", "=", ["open", "closed"])];
        assert_eq!(
            convert_filters(&filters).unwrap(),
            r#"[{"status":{"operator":"=","values":["open","closed"]}}]"#
        );
    }

    #[test]
    fn test_convert_maps_property_and_operator() {
        let filters = vec![Filter::new("summary.value", "contains", ["meeting"])];
        assert_eq!(
            convert_filters(&filters).unwrap(),
            r#"[{"subject":{"operator":"=","values":["meeting"]}}]"#
        );
    }

    #[test]
    fn test_convert_splits_date_ranges() {
        let filters = vec![Filter::new(
            "startDate",
            "between",
            ["2024-01-01/2024-02-01"],
        )];
        assert_eq!(
            convert_filters(&filters).unwrap(),
            r#"[{"startDate":{"operator":"<>d","values":["2024-01-01","2024-02-01"]}}]"#
        );
    }

    #[test]
    fn test_convert_keeps_open_ranges_whole() {
        let filters = vec![Filter::new("dueDate", "between", ["2024-01-01/"])];
        assert_eq!(
            convert_filters(&filters).unwrap(),
            r#"[{"dueDate":{"operator":"<>d","values":["2024-01-01/"]}}]"#
        );
    }

    #[test]
    fn test_convert_keeps_no_value_operators() {
        let filters = vec![Filter::new("dueDate", "empty", Vec::<String>::new())];
        assert_eq!(
            convert_filters(&filters).unwrap(),
            r#"[{"dueDate":{"operator":"!*","values":[]}}]"#
        );
    }

    #[test]
    fn test_convert_takes_operator_of_first_surviving_constraint() {
        let filters = vec![Filter {
            property: "status".to_string(),
            constraints: vec![
                Constraint::new("contains", [""]),
                Constraint::new("=", ["1"]),
                Constraint::new("!", ["2"]),
            ],
        }];
        assert_eq!(
            convert_filters(&filters).unwrap(),
            r#"[{"status":{"operator":"=","values":["1","2"]}}]"#
        );
    }

    #[test]
    fn test_convert_stored_matches_structured_shape() {
        let stored = vec![StoredFilter {
            property: "status".to_string(),
            operator: "=".to_string(),
            values: vec!["1".to_string()],
        }];
        let filters = vec![Filter::new("status", "=", ["1"])];
        assert_eq!(
            convert_stored_filters(&stored).unwrap(),
            convert_filters(&filters).unwrap()
        );
    }

    #[test]
    fn test_convert_stored_keeps_values_as_given() {
        let stored = vec![StoredFilter {
            property: "summary.value".to_string(),
            operator: "contains".to_string(),
            values: vec!["meeting".to_string(), String::new()],
        }];
        assert_eq!(
            convert_stored_filters(&stored).unwrap(),
            r#"[{"summary.value":{"operator":"contains","values":["meeting",""]}}]"#
        );
    }

    #[test]
    fn test_parse_stored_filters_accepts_abbreviated_names() {
        let parsed = parse_stored_filters(r#"[{"n":"status","o":"=","v":["1"]}]"#).unwrap();
        assert_eq!(
            parsed,
            vec![StoredFilter {
                property: "status".to_string(),
                operator: "=".to_string(),
                values: vec!["1".to_string()],
            }]
        );
    }

    #[test]
    fn test_parse_stored_filters_blank_input() {
        assert_eq!(parse_stored_filters("  ").unwrap(), Vec::new());
    }

    #[test]
    fn test_parse_stored_filters_rejects_malformed_input() {
        assert!(parse_stored_filters("not json").is_err());
    }

    #[test]
    fn test_merge_appends_new_property() {
        let filters = vec![Filter::new("status", "=", ["1"])];
        let stored = r#"[{"n":"project","o":"=","v":["9"]}]"#;
        assert_eq!(
            merge_filters(&filters, stored).unwrap(),
            r#"[{"status":{"operator":"=","values":["1"]}},{"project":{"operator":"=","values":["9"]}}]"#
        );
    }

    #[test]
    fn test_merge_unions_values_without_duplicates() {
        let filters = vec![Filter::new("status", "=", ["1", "2"])];
        let stored = r#"[{"n":"status","o":"=","v":["2","3"]}]"#;
        assert_eq!(
            merge_filters(&filters, stored).unwrap(),
            r#"[{"status":{"operator":"=","values":["1","2","3"]}}]"#
        );
    }

    #[test]
    fn test_merge_adds_stored_operator_group() {
        let filters = vec![Filter::new("status", "=", ["1"])];
        let stored = r#"[{"n":"status","o":"!","v":["4"]}]"#;
        assert_eq!(
            merge_filters(&filters, stored).unwrap(),
            r#"[{"status":{"operator":"=","values":["1"]}},{"status":{"operator":"!","values":["4"]}}]"#
        );
    }

    #[test]
    fn test_merge_keeps_last_filter_per_property() {
        let filters = vec![
            Filter::new("status", "=", ["1"]),
            Filter::new("status", "!", ["2"]),
        ];
        assert_eq!(
            merge_filters(&filters, "").unwrap(),
            r#"[{"status":{"operator":"!","values":["2"]}}]"#
        );
    }

    #[test]
    fn test_merge_maps_live_filters_only() {
        let filters = vec![Filter::new("progress", "=", ["50"])];
        let stored = r#"[{"n":"progress","o":"=","v":["75"]}]"#;
        assert_eq!(
            merge_filters(&filters, stored).unwrap(),
            r#"[{"percentageDone":{"operator":"=","values":["50"]}},{"progress":{"operator":"=","values":["75"]}}]"#
        );
    }

    #[test]
    fn test_mapping_tables_have_unique_keys() {
        for table in [PROPERTY_MAP, OPERATOR_MAP] {
            for (index, (from, _)) in table.iter().enumerate() {
                assert!(
                    !table[index + 1..].iter().any(|(other, _)| other == from),
                    "duplicate mapping for {from}"
                );
            }
        }
    }
}
