//! Generated-content classification.

use serde::{Deserialize, Serialize};

/// Kind of generated content a snapshot or live field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// HTML markup.
    Markup,
    /// CSS stylesheet.
    Stylesheet,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Markup => write!(f, "markup"),
            ContentKind::Stylesheet => write!(f, "stylesheet"),
        }
    }
}
