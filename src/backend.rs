//! The seam between the chat layer and the HTTP backend.

use std::pin::Pin;

use futures::Stream;

use crate::error::Result;
use crate::types::{
    ChatMessage, ChatResponse, Conversation, ConversationSummary, HealthStatus, ServiceInfo,
    StreamEvent,
};

/// A stream of events read from a streamed chat response.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Everything the chat layer needs from the backend.
///
/// [`ChatClient`](crate::ChatClient) implements this over HTTP.  The chat
/// session is generic over it so that it can be driven by any source of
/// replies.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the conversation and wait for a single reply.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse>;

    /// Send the conversation and stream the reply.
    ///
    /// Errors returned here are transport errors that happened before the
    /// body started; errors inside the body arrive through the stream.
    async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<EventStream>;

    /// Ask for a production-readiness assessment of `service`.
    async fn production_readiness(
        &self,
        service: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatResponse>;

    /// Check whether the backend is up.
    async fn health(&self) -> Result<HealthStatus>;

    /// Fetch the backend's self-description.
    async fn service_info(&self) -> Result<ServiceInfo>;

    /// List known conversations.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;

    /// Fetch one conversation with its messages.
    async fn get_conversation(&self, id: &str) -> Result<Conversation>;

    /// Delete one conversation, returning the backend's confirmation text.
    async fn delete_conversation(&self, id: &str) -> Result<String>;
}
