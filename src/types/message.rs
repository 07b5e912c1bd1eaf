use serde::{Deserialize, Serialize};

use crate::types::{MessageRole, Source};

/// One entry of the transcript.
///
/// Messages are built once and appended; the transcript hands out shared
/// references only, so an appended message never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// The author of the message.
    pub role: MessageRole,

    /// The message body. Assistant content is Markdown.
    pub content: String,

    /// Citations backing an assistant answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

impl Message {
    /// Creates a message typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            sources: None,
        }
    }

    /// Creates an assistant message without citations.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            sources: None,
        }
    }

    /// Creates an assistant answer carrying its citations.
    pub fn answer(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            sources: Some(sources),
        }
    }

    /// Returns true if the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// Returns the citations, or an empty slice when there are none.
    pub fn sources(&self) -> &[Source] {
        self.sources.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_has_no_sources() {
        let message = Message::user("What is this about?");
        assert!(message.is_user());
        assert!(message.sources.is_none());
        assert!(message.sources().is_empty());
    }

    #[test]
    fn answer_keeps_source_order() {
        let message = Message::answer(
            "**Yes.**",
            vec![Source::page("b.pdf", 1), Source::page("a.pdf", 0)],
        );
        assert!(!message.is_user());
        assert_eq!(message.sources()[0], Source::page("b.pdf", 1));
        assert_eq!(message.sources()[1], Source::page("a.pdf", 0));
    }
}
