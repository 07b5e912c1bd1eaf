use serde::{Deserialize, Serialize};

/// Body of a question sent to the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The question exactly as the user typed it.
    pub question: String,
}

impl ChatRequest {
    /// Creates a new ChatRequest.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}
