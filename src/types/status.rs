use serde::{Deserialize, Serialize};

use super::Linkable;

/// A workflow status a work package can be in, e.g. "New" or "In progress".
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub color: String,
    #[serde(rename = "self")]
    pub self_ref: Linkable,
}
