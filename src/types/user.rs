use serde::{Deserialize, Serialize};

use super::Linkable;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(rename = "self")]
    pub self_ref: Linkable,
}
