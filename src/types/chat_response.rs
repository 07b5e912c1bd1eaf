use serde::{Deserialize, Serialize};

use crate::types::Source;

/// Answer returned by the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    /// The answer, formatted as Markdown.
    pub response: String,

    /// Metadata of the chunks the answer was built from, in retrieval order.
    #[serde(default)]
    pub source_docs: Vec<Source>,
}

impl ChatResponse {
    /// Creates a new ChatResponse.
    pub fn new(response: impl Into<String>, source_docs: Vec<Source>) -> Self {
        Self {
            response: response.into(),
            source_docs,
        }
    }
}
