use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a message in the transcript.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The person typing questions.
    User,
    /// The document service, or the client speaking on its behalf.
    Assistant,
}

impl MessageRole {
    /// Returns the wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
