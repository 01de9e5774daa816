use serde::{Deserialize, Serialize};

/// A `{href, title}` reference to another OpenProject entity, e.g. the
/// project or assignee of a work package.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Linkable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Linkable {
    pub fn new(href: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            title: Some(title.into()),
        }
    }

    /// True when neither an href nor a title is present.
    pub fn is_empty(&self) -> bool {
        self.href.is_none() && self.title.is_none()
    }
}
