use serde::{Deserialize, Serialize};

use crate::types::Role;
use crate::utils::time;

/// One message in a chat conversation.
///
/// Messages are treated as values: a streamed reply is shown by replacing
/// the placeholder with a fresh snapshot carrying the longer content, never
/// by mutating a message that an observer may still hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,

    /// The text of the message.
    pub content: String,

    /// RFC 3339 creation time, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatMessage {
    /// Create a new message without a timestamp.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    /// Create a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content).with_timestamp(time::now_rfc3339())
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create the empty assistant message that a streamed reply grows into.
    pub fn placeholder() -> Self {
        Self::assistant(String::new()).with_timestamp(time::now_rfc3339())
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Returns a copy of this message whose content is `content`.
    pub fn snapshot(&self, content: impl Into<String>) -> Self {
        Self {
            role: self.role,
            content: content.into(),
            timestamp: self.timestamp.clone(),
        }
    }

    /// Returns true if this message is an assistant message with no text yet.
    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Assistant && self.content.is_empty()
    }
}
