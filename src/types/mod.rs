// Public modules
pub mod chat_message;
pub mod chat_request;
pub mod chat_response;
pub mod conversation;
pub mod health;
pub mod role;
pub mod stream_event;
pub mod stream_frame;

// Re-exports
pub use chat_message::ChatMessage;
pub use chat_request::{ChatRequest, ProductionReadinessRequest};
pub use chat_response::ChatResponse;
pub use conversation::{
    Conversation, ConversationList, ConversationSummary, DeleteConversationResponse, Session,
};
pub use health::{HealthStatus, ServiceInfo};
pub use role::{Role, RoleParseError};
pub use stream_event::{Completion, StreamEvent};
pub use stream_frame::{DATA_PREFIX, StreamFrame, StreamPayload, TERMINATOR};
