use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// One entry of the backend's conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation identifier.
    pub id: String,

    /// Display title.
    pub title: String,

    /// The most recent message, for previews.
    #[serde(default)]
    pub last_message: String,

    /// RFC 3339 time of the most recent message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Body of `GET /api/conversations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationList {
    /// Known conversations, in the order the backend returns them.
    pub conversations: Vec<ConversationSummary>,
}

/// Body of `GET /api/conversations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation identifier.
    pub id: String,

    /// The messages of the conversation, oldest first.
    pub messages: Vec<ChatMessage>,
}

/// Body of `DELETE /api/conversations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConversationResponse {
    /// Confirmation text.
    pub message: String,
}

/// Display metadata for one chat session in a session list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session identifier; matches the backend conversation id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Short preview of the latest message.
    pub preview: String,
    /// RFC 3339 time of the latest message, when known.
    pub timestamp: Option<String>,
    /// Number of messages, when known.
    pub message_count: usize,
}

/// Maximum number of characters shown in a session preview.
pub const PREVIEW_CHARS: usize = 60;

impl Session {
    /// Truncate `text` to a preview of at most [`PREVIEW_CHARS`] characters.
    pub fn preview_of(text: &str) -> String {
        let text = text.trim();
        if text.chars().count() <= PREVIEW_CHARS {
            return text.to_string();
        }
        let mut preview: String = text.chars().take(PREVIEW_CHARS - 1).collect();
        preview.push('…');
        preview
    }
}

impl From<&ConversationSummary> for Session {
    fn from(summary: &ConversationSummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            preview: Session::preview_of(&summary.last_message),
            timestamp: summary.timestamp.clone(),
            message_count: 0,
        }
    }
}

impl From<&Conversation> for Session {
    fn from(conversation: &Conversation) -> Self {
        let first_user = conversation
            .messages
            .iter()
            .find(|m| m.role == crate::types::Role::User)
            .map(|m| m.content.as_str());
        let last = conversation.messages.last();
        Self {
            id: conversation.id.clone(),
            title: Session::preview_of(first_user.unwrap_or(&conversation.id)),
            preview: Session::preview_of(last.map(|m| m.content.as_str()).unwrap_or("")),
            timestamp: last.and_then(|m| m.timestamp.clone()),
            message_count: conversation.messages.len(),
        }
    }
}
