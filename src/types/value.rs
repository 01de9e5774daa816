use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Linkable;

/// A typed field value of a work package.
///
/// Display layers match on the variant instead of probing the runtime type
/// of an untyped property bag. Untagged variants deserialize in declaration
/// order, so `Date` must stay ahead of the catch-all `Text`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Date(NaiveDate),
    Number(i64),
    Text(String),
    Link(Linkable),
    List(Vec<FieldValue>),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<Linkable> for FieldValue {
    fn from(value: Linkable) -> Self {
        FieldValue::Link(value)
    }
}
