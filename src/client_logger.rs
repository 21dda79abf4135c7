//! Logging trait for chat client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log all backend interactions passing through the [`ChatClient`].
//!
//! [`ChatClient`]: crate::ChatClient

use crate::{ChatMessage, ChatResponse, StreamEvent};

/// A trait for logging chat client operations.
///
/// Implement this trait to capture and record every backend interaction,
/// including both non-streaming responses and individual streaming events.
///
/// # Example
///
/// ```rust,ignore
/// use architect_chat::{ChatMessage, ChatResponse, ClientLogger, StreamEvent};
///
/// struct StderrLogger;
///
/// impl ClientLogger for StderrLogger {
///     fn log_response(&self, response: &ChatResponse) {
///         eprintln!("response: {}", response.message.content);
///     }
///
///     fn log_stream_event(&self, event: &StreamEvent) {
///         eprintln!("stream event: {event:?}");
///     }
///
///     fn log_stream_message(&self, message: &ChatMessage) {
///         eprintln!("stream complete: {}", message.content);
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log a complete response from a non-streaming call.
    ///
    /// Called once per successful chat or readiness request.
    fn log_response(&self, response: &ChatResponse);

    /// Log an individual streaming event.
    ///
    /// Called for each [`StreamEvent`] read from a streamed response, in
    /// arrival order.
    fn log_stream_event(&self, event: &StreamEvent);

    /// Log the final message of a completed stream.
    ///
    /// Called once when a stream completes successfully, with the assistant
    /// message as the user last saw it.
    fn log_stream_message(&self, message: &ChatMessage);
}
