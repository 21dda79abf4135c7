use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Body of a request to the chat endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,

    /// Whether the backend should stream its answer.
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Create a non-streaming request.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            stream: false,
        }
    }

    /// Create a streaming request.
    pub fn streaming(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            stream: true,
        }
    }
}

/// Body of a request to the production-readiness endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionReadinessRequest {
    /// Name of the service being assessed.
    pub service: String,

    /// The conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
}

impl ProductionReadinessRequest {
    /// Create a new readiness request.
    pub fn new(service: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            service: service.into(),
            messages,
        }
    }
}
