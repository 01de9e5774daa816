use serde::{Deserialize, Serialize};

use super::Linkable;

/// A work package type, e.g. "Task" or "Milestone".
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WorkPackageType {
    pub id: i64,
    pub name: String,
    pub color: String,
    #[serde(rename = "self")]
    pub self_ref: Linkable,
}
