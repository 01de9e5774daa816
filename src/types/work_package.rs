use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{FieldValue, Linkable};

/// A single work package, with entity references already rewritten into
/// browser-facing URLs of the originating instance.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkPackage {
    pub id: i64,
    #[serde(rename = "_type")]
    pub record_type: String,
    pub subject: String,
    /// Rendered HTML body of the description.
    pub description: Option<String>,
    pub percentage_done: i64,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub derived_start_date: Option<NaiveDate>,
    pub derived_due_date: Option<NaiveDate>,
    pub created_at: Option<NaiveDate>,
    pub updated_at: Option<NaiveDate>,
    #[serde(rename = "self")]
    pub self_ref: Linkable,
    #[serde(rename = "type")]
    pub work_package_type: Linkable,
    pub status: Linkable,
    pub author: Linkable,
    pub assignee: Linkable,
    pub project: Linkable,
    pub priority: Linkable,
}

impl WorkPackage {
    /// The populated fields as `(name, value)` pairs. Absent dates and empty
    /// entity references are left out, so consumers can render the listing
    /// without re-checking each field for presence.
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = vec![
            ("id", FieldValue::from(self.id)),
            ("subject", FieldValue::from(self.subject.clone())),
            ("percentageDone", FieldValue::from(self.percentage_done)),
        ];
        if let Some(description) = &self.description {
            fields.push(("description", FieldValue::from(description.clone())));
        }
        let dates = [
            ("startDate", self.start_date),
            ("dueDate", self.due_date),
            ("derivedStartDate", self.derived_start_date),
            ("derivedDueDate", self.derived_due_date),
            ("createdAt", self.created_at),
            ("updatedAt", self.updated_at),
        ];
        for (name, date) in dates {
            if let Some(date) = date {
                fields.push((name, FieldValue::from(date)));
            }
        }
        let links = [
            ("self", &self.self_ref),
            ("type", &self.work_package_type),
            ("status", &self.status),
            ("author", &self.author),
            ("assignee", &self.assignee),
            ("project", &self.project),
            ("priority", &self.priority),
        ];
        for (name, link) in links {
            if !link.is_empty() {
                fields.push((name, FieldValue::from(link.clone())));
            }
        }
        fields
    }
}
