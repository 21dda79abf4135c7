use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// A non-streaming reply from the chat or readiness endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub message: ChatMessage,

    /// Identifier of the conversation the reply belongs to, when the backend assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn deserialization() {
        let json = r#"{
            "message": {"role": "assistant", "content": "Hello"},
            "conversation_id": "dummy-conversation-id"
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.message.content, "Hello");
        assert_eq!(
            response.conversation_id.as_deref(),
            Some("dummy-conversation-id")
        );
    }

    #[test]
    fn conversation_id_is_optional() {
        let json = r#"{"message": {"role": "assistant", "content": "ok", "timestamp": null}}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.conversation_id.is_none());
        assert!(response.message.timestamp.is_none());
    }
}
