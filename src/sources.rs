//! Turning the citations of an answer into display labels.
//!
//! Labels are derived on every render and never stored. Two citations that
//! format to the same label collapse into one, even when they point at
//! different documents that share a file name.

use std::collections::HashSet;

use crate::types::Source;

/// Name shown when a citation carries no usable document identifier.
pub const FALLBACK_DOCUMENT_NAME: &str = "Document";

/// Returns the display name of a document identifier: its last path segment.
///
/// Both `/` and `\` separate segments, since the identifier is whatever path
/// the service stored the upload under.
pub fn display_name(identifier: Option<&str>) -> &str {
    identifier
        .and_then(|id| id.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_DOCUMENT_NAME)
}

/// Formats one citation as `name` or `name (Page N)`, with `N` one-based.
pub fn source_label(source: &Source) -> String {
    let name = display_name(source.source.as_deref());
    match source.page {
        Some(page) => format!("{name} (Page {})", page.saturating_add(1)),
        None => name.to_string(),
    }
}

/// Formats every citation and drops repeated labels, keeping first-seen order.
pub fn dedup_labels(sources: &[Source]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(sources.len());
    sources
        .iter()
        .map(source_label)
        .filter(|label| seen.insert(label.clone()))
        .collect()
}
