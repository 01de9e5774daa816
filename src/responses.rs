//! Wire types for the OpenProject REST v3 collection responses.

use serde::{Deserialize, Serialize};

/// One page of typed records together with its pagination metadata.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub offset: usize,
    pub page_size: usize,
    pub total: usize,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, offset: usize, page_size: usize, total: usize) -> Self {
        Self {
            items,
            offset,
            page_size,
            total,
        }
    }
}

/// The `{total, _embedded: {elements}}` envelope every collection endpoint
/// responds with. Whole-collection endpoints omit `total`.
#[derive(Deserialize)]
pub struct Collection<T> {
    pub total: Option<usize>,
    #[serde(rename = "_embedded")]
    pub embedded: Embedded<T>,
}

#[derive(Deserialize)]
pub struct Embedded<T> {
    #[serde(default = "Vec::new")]
    pub elements: Vec<T>,
}

/// A work package as returned by the backend, before entity references are
/// rewritten against the instance UI.
#[derive(Deserialize)]
pub struct WorkPackageElement {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "_type", default)]
    pub record_type: String,
    #[serde(default)]
    pub subject: String,
    pub description: Option<Formattable>,
    #[serde(rename = "percentageDone", default)]
    pub percentage_done: i64,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "dueDate")]
    pub due_date: Option<String>,
    #[serde(rename = "derivedStartDate")]
    pub derived_start_date: Option<String>,
    #[serde(rename = "derivedDueDate")]
    pub derived_due_date: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(rename = "_links", default)]
    pub links: WorkPackageLinks,
}

/// A rich-text field, carried in raw and rendered form.
#[derive(Deserialize, Default)]
pub struct Formattable {
    pub raw: Option<String>,
    pub html: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct WorkPackageLinks {
    #[serde(rename = "self")]
    pub self_link: Option<Link>,
    #[serde(rename = "type")]
    pub work_package_type: Option<Link>,
    pub status: Option<Link>,
    pub author: Option<Link>,
    pub assignee: Option<Link>,
    pub project: Option<Link>,
    pub priority: Option<Link>,
}

/// A raw `_links` entry; the href is relative to the API root.
#[derive(Deserialize, Default, Clone)]
pub struct Link {
    pub href: Option<String>,
    pub title: Option<String>,
}

/// A user or project element, trimmed to the fields the `select` query
/// parameter asks for.
#[derive(Deserialize)]
pub struct NamedElement {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// A type, status or priority element.
#[derive(Deserialize)]
pub struct ColoredElement {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_envelope_deserializes() {
        let body = r##"{
            "total": 27,
            "_embedded": {
                "elements": [
                    {"id": 1, "name": "New", "color": "#35C53F"},
                    {"id": 7, "name": "In progress", "color": "#1A67A3"}
                ]
            }
        }"##;

        let collection: Collection<ColoredElement> = serde_json::from_str(body).unwrap();
        assert_eq!(collection.total, Some(27));
        assert_eq!(collection.embedded.elements.len(), 2);
        assert_eq!(collection.embedded.elements[0].color, "#35C53F");
        assert_eq!(collection.embedded.elements[1].name, "In progress");
    }

    #[test]
    fn test_collection_total_is_optional() {
        let body = r#"{"_embedded": {"elements": []}}"#;
        let collection: Collection<NamedElement> = serde_json::from_str(body).unwrap();
        assert_eq!(collection.total, None);
        assert!(collection.embedded.elements.is_empty());
    }

    #[test]
    fn test_paginated_result_serializes_camel_case() {
        let page = PaginatedResult::new(vec!["a".to_string()], 30, 15, 120);
        let json = serde_json::to_string(&page).unwrap();
        assert_eq!(json, r#"{"items":["a"],"offset":30,"pageSize":15,"total":120}"#);
    }
}
