use serde::{Deserialize, Serialize};

use crate::sources::source_label;

/// A citation pointing at the document (and optionally the page) an answer
/// was drawn from.
///
/// Sources arrive as the metadata of retrieved chunks, so any other keys the
/// service includes are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Source {
    /// Path-like identifier of the originating document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Zero-based page number, present only for paginated formats.
    ///
    /// Any integer is accepted and kept as received, negative values included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
}

impl Source {
    /// Creates a new Source.
    pub fn new(source: Option<String>, page: Option<i64>) -> Self {
        Self { source, page }
    }

    /// Creates a Source for a document without pages.
    pub fn document(source: impl Into<String>) -> Self {
        Self::new(Some(source.into()), None)
    }

    /// Creates a Source for a single page of a paginated document.
    pub fn page(source: impl Into<String>, page: i64) -> Self {
        Self::new(Some(source.into()), Some(page))
    }

    /// Returns the human-readable label for this source.
    pub fn label(&self) -> String {
        source_label(self)
    }
}
