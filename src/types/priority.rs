use serde::{Deserialize, Serialize};

use super::Linkable;

/// A priority level assignable to work packages, e.g. "Low" or "Immediate".
/// The set is instance-defined, so the record carries the backend's id and
/// display color instead of a closed enum.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Priority {
    pub id: i64,
    pub name: String,
    pub color: String,
    #[serde(rename = "self")]
    pub self_ref: Linkable,
}
