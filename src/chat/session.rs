//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns the chat state
//! and drives user turns against a [`ChatBackend`].

use std::ops::{Deref, DerefMut};

use tokio_util::sync::CancellationToken;

use crate::backend::ChatBackend;
use crate::chat::config::ChatConfig;
use crate::chat::state::{ChatState, StateObserver, TurnPhase};
use crate::client::ChatClient;
use crate::consumer::{ConsumeOutcome, Consumed, StreamConsumer};
use crate::error::{Error, Result};
use crate::observability::TURNS_CANCELLED;
use crate::render::Renderer;
use crate::types::{ChatMessage, Completion, HealthStatus, ServiceInfo, Session};

/// A chat session that manages conversation state and backend interactions.
///
/// At most one turn is outstanding at a time; the state's phase guard
/// rejects a new turn while one is in flight.
pub struct ChatSession<B: ChatBackend = ChatClient> {
    backend: B,
    config: ChatConfig,
    state: ChatState,
    observers: Vec<Box<dyn StateObserver>>,
    turns_completed: u64,
    turns_failed: u64,
    turns_cancelled: u64,
    chars_received: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// The number of known sessions.
    pub session_count: usize,
    /// The selected session, if any.
    pub current_session: Option<String>,
    /// The phase of the current turn.
    pub phase: TurnPhase,
    /// Whether replies are streamed.
    pub stream: bool,
    /// Service named in readiness requests.
    pub service: String,
    /// Turns that completed normally.
    pub turns_completed: u64,
    /// Turns that ended in a failure notice.
    pub turns_failed: u64,
    /// Turns cancelled by the user.
    pub turns_cancelled: u64,
    /// Characters of reply text received.
    pub chars_received: u64,
}

impl ChatSession<ChatClient> {
    /// Creates a new chat session talking HTTP to the configured backend.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = ChatClient::with_options(config.base_url.clone(), config.timeout)?;
        Ok(Self::with_backend(client, config))
    }
}

impl<B: ChatBackend> ChatSession<B> {
    /// Creates a new chat session with a custom backend.
    pub fn with_backend(backend: B, config: ChatConfig) -> Self {
        Self {
            backend,
            config,
            state: ChatState::new(),
            observers: Vec::new(),
            turns_completed: 0,
            turns_failed: 0,
            turns_cancelled: 0,
            chars_received: 0,
        }
    }

    /// The backend this session talks to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The current chat state.
    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Register an observer that is notified after every state change.
    pub fn subscribe(&mut self, observer: impl StateObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Switch between streamed and single replies.
    pub fn set_stream(&mut self, stream: bool) {
        self.config.stream = stream;
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.state.messages().len()
    }

    /// Sends a user message and renders the reply.
    ///
    /// This method:
    /// 1. Adds the user message and an empty reply to the state
    /// 2. Sends the conversation to the backend
    /// 3. Renders reply fragments as they arrive
    /// 4. Records how the turn ended
    ///
    /// Backend failures do not produce `Err`; they end the turn with a
    /// failure notice in place of the reply and are reported through the
    /// returned outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if a turn is already in flight or `text` is blank.
    pub async fn send(
        &mut self,
        text: &str,
        renderer: &mut dyn Renderer,
        cancel: CancellationToken,
    ) -> Result<ConsumeOutcome> {
        self.state.begin_turn(text)?;
        self.notify();
        let mut turn = TurnGuard { session: self };
        renderer.start_response();

        let consumed = if turn.config.stream {
            turn.stream_turn(renderer, cancel).await?
        } else {
            turn.single_turn(renderer, cancel).await
        };

        turn.state.finish_turn(&consumed)?;
        turn.notify();
        turn.record(&consumed);
        drop(turn);

        match &consumed.outcome {
            ConsumeOutcome::Completed(_) => renderer.finish_response(),
            ConsumeOutcome::Cancelled => renderer.print_interrupted(),
            ConsumeOutcome::Failed(_) | ConsumeOutcome::TransportFailed(_) => {
                renderer.print_notice(&consumed.message.content)
            }
        }
        Ok(consumed.outcome)
    }

    async fn stream_turn(
        &mut self,
        renderer: &mut dyn Renderer,
        cancel: CancellationToken,
    ) -> Result<Consumed> {
        let history = self.state.request_history();
        let placeholder = self.current_placeholder();
        let Self {
            backend,
            state,
            observers,
            ..
        } = self;

        let events = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                TURNS_CANCELLED.click();
                return Ok(Consumed {
                    message: placeholder,
                    outcome: ConsumeOutcome::Cancelled,
                });
            }
            events = backend.chat_stream(&history) => events,
        };
        let events = match events {
            Ok(events) => events,
            Err(err) => return Ok(Consumed::transport_failure(&placeholder, err)),
        };

        state.streaming()?;
        for observer in observers.iter_mut() {
            observer.on_state_change(state);
        }

        let mut on_snapshot = |snapshot: &ChatMessage, fragment: &str| {
            if state.update_placeholder(snapshot.clone()).is_ok() {
                for observer in observers.iter_mut() {
                    observer.on_state_change(state);
                }
            }
            renderer.print_text(fragment);
        };
        let consumer = StreamConsumer::new().with_cancellation(cancel);
        Ok(consumer.consume(events, placeholder, &mut on_snapshot).await)
    }

    async fn single_turn(
        &mut self,
        renderer: &mut dyn Renderer,
        cancel: CancellationToken,
    ) -> Consumed {
        let history = self.state.request_history();
        let placeholder = self.current_placeholder();

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                TURNS_CANCELLED.click();
                return Consumed {
                    message: placeholder,
                    outcome: ConsumeOutcome::Cancelled,
                };
            }
            reply = self.backend.chat(&history) => reply,
        };
        match reply {
            Ok(response) => {
                let message = placeholder.snapshot(response.message.content);
                renderer.print_text(&message.content);
                Consumed {
                    message,
                    outcome: ConsumeOutcome::Completed(Completion::EndOfStream),
                }
            }
            Err(err) => Consumed::transport_failure(&placeholder, err),
        }
    }

    /// Ask for a production-readiness assessment and append it.
    ///
    /// `service` defaults to the configured service.
    pub async fn production_readiness(&mut self, service: Option<&str>) -> Result<ChatMessage> {
        if self.state.is_busy() {
            return Err(Error::busy("a reply is still in progress"));
        }
        let service = service.unwrap_or(&self.config.service).to_string();
        let history = self.state.request_history();
        let response = self
            .backend
            .production_readiness(&service, &history)
            .await?;
        self.state.push_reply(response.message.clone())?;
        self.notify();
        Ok(response.message)
    }

    /// Clears the conversation and deselects the current session.
    pub fn clear(&mut self) -> Result<()> {
        self.state.reset()?;
        self.notify();
        Ok(())
    }

    /// Reload the session list from the backend.
    pub async fn refresh_sessions(&mut self) -> Result<&[Session]> {
        let summaries = self.backend.list_conversations().await?;
        self.state
            .set_sessions(summaries.iter().map(Session::from).collect());
        self.notify();
        Ok(self.state.sessions())
    }

    /// Load conversation `id` and make it current.
    ///
    /// Returns the number of messages loaded.
    pub async fn load_conversation(&mut self, id: &str) -> Result<usize> {
        if self.state.is_busy() {
            return Err(Error::busy("a reply is still in progress"));
        }
        let conversation = self.backend.get_conversation(id).await?;
        if !self.state.sessions().iter().any(|s| s.id == conversation.id) {
            let mut sessions = self.state.sessions().to_vec();
            sessions.push(Session::from(&conversation));
            self.state.set_sessions(sessions);
        }
        let count = conversation.messages.len();
        self.state
            .select_session(conversation.id, conversation.messages)?;
        self.notify();
        Ok(count)
    }

    /// Delete conversation `id` on the backend and forget it locally.
    ///
    /// Returns the backend's confirmation text.
    pub async fn delete_conversation(&mut self, id: &str) -> Result<String> {
        if self.state.is_busy() {
            return Err(Error::busy("a reply is still in progress"));
        }
        let confirmation = self.backend.delete_conversation(id).await?;
        self.state.remove_session(id)?;
        self.notify();
        Ok(confirmation)
    }

    /// Check whether the backend is up.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.backend.health().await
    }

    /// Fetch the backend's self-description.
    pub async fn service_info(&self) -> Result<ServiceInfo> {
        self.backend.service_info().await
    }

    /// Returns aggregated session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            message_count: self.message_count(),
            session_count: self.state.sessions().len(),
            current_session: self.state.current_session().map(str::to_string),
            phase: self.state.phase(),
            stream: self.config.stream,
            service: self.config.service.clone(),
            turns_completed: self.turns_completed,
            turns_failed: self.turns_failed,
            turns_cancelled: self.turns_cancelled,
            chars_received: self.chars_received,
        }
    }

    fn current_placeholder(&self) -> ChatMessage {
        self.state
            .placeholder()
            .cloned()
            .unwrap_or_else(ChatMessage::placeholder)
    }

    fn record(&mut self, consumed: &Consumed) {
        match consumed.outcome {
            ConsumeOutcome::Completed(_) => {
                self.turns_completed += 1;
                self.chars_received += consumed.message.content.chars().count() as u64;
            }
            ConsumeOutcome::Cancelled => {
                self.turns_cancelled += 1;
                self.chars_received += consumed.message.content.chars().count() as u64;
            }
            ConsumeOutcome::Failed(_) | ConsumeOutcome::TransportFailed(_) => {
                self.turns_failed += 1;
            }
        }
    }

    fn notify(&mut self) {
        for observer in self.observers.iter_mut() {
            observer.on_state_change(&self.state);
        }
    }
}

/// Ends the turn in flight if `send` returns early or its future is dropped.
struct TurnGuard<'a, B: ChatBackend> {
    session: &'a mut ChatSession<B>,
}

impl<B: ChatBackend> Deref for TurnGuard<'_, B> {
    type Target = ChatSession<B>;

    fn deref(&self) -> &Self::Target {
        self.session
    }
}

impl<B: ChatBackend> DerefMut for TurnGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session
    }
}

impl<B: ChatBackend> Drop for TurnGuard<'_, B> {
    fn drop(&mut self) {
        if self.session.state.abandon_turn() {
            log::warn!("reply abandoned while still in flight");
            TURNS_CANCELLED.click();
            self.session.turns_cancelled += 1;
            self.session.notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::{Arc, Mutex};

    use std::time::Duration;

    use bytes::Bytes;
    use futures::{StreamExt, stream};

    use crate::backend::EventStream;
    use crate::consumer::TRANSPORT_FAILURE_MESSAGE;
    use crate::sse::process_stream;
    use crate::types::{ChatResponse, Conversation, ConversationSummary, Role};

    #[derive(Default)]
    struct FakeBackend {
        body: Vec<&'static str>,
        reply: Option<String>,
        refuse: bool,
        stall: bool,
        conversations: Vec<Conversation>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
        services: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn streaming(body: &[&'static str]) -> Self {
            Self {
                body: body.to_vec(),
                ..Self::default()
            }
        }

        fn check(&self, messages: &[ChatMessage]) -> Result<()> {
            self.requests.lock().unwrap().push(messages.to_vec());
            if self.refuse {
                Err(Error::connection("connection refused", None))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for FakeBackend {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
            self.check(messages)?;
            Ok(ChatResponse {
                message: ChatMessage::assistant(self.reply.clone().unwrap_or_default()),
                conversation_id: None,
            })
        }

        async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<EventStream> {
            self.check(messages)?;
            let chunks: Vec<std::result::Result<Bytes, io::Error>> = self
                .body
                .iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect();
            if self.stall {
                let body = stream::iter(chunks).chain(stream::pending());
                return Ok(Box::pin(process_stream(body)));
            }
            Ok(Box::pin(process_stream(stream::iter(chunks))))
        }

        async fn production_readiness(
            &self,
            service: &str,
            messages: &[ChatMessage],
        ) -> Result<ChatResponse> {
            self.check(messages)?;
            self.services.lock().unwrap().push(service.to_string());
            Ok(ChatResponse {
                message: ChatMessage::assistant(format!("{service} is ready")),
                conversation_id: None,
            })
        }

        async fn health(&self) -> Result<HealthStatus> {
            Ok(HealthStatus {
                status: "healthy".to_string(),
                timestamp: time::OffsetDateTime::UNIX_EPOCH,
            })
        }

        async fn service_info(&self) -> Result<ServiceInfo> {
            Ok(ServiceInfo {
                status: "running".to_string(),
                version: "1.0.0".to_string(),
                azure_ai_enabled: false,
            })
        }

        async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
            Ok(self
                .conversations
                .iter()
                .map(|c| ConversationSummary {
                    id: c.id.clone(),
                    title: format!("Conversation {}", c.id),
                    last_message: String::new(),
                    timestamp: None,
                })
                .collect())
        }

        async fn get_conversation(&self, id: &str) -> Result<Conversation> {
            self.conversations
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or_else(|| Error::not_found("Conversation not found", Some(id.to_string())))
        }

        async fn delete_conversation(&self, id: &str) -> Result<String> {
            self.get_conversation(id).await?;
            Ok("Conversation deleted successfully".to_string())
        }
    }

    #[derive(Default)]
    struct CaptureRenderer {
        text: String,
        notices: Vec<String>,
        finished: usize,
        interrupted: usize,
    }

    impl Renderer for CaptureRenderer {
        fn print_text(&mut self, text: &str) {
            self.text.push_str(text);
        }

        fn print_notice(&mut self, notice: &str) {
            self.notices.push(notice.to_string());
        }

        fn print_error(&mut self, error: &str) {
            self.notices.push(error.to_string());
        }

        fn print_info(&mut self, _: &str) {}

        fn finish_response(&mut self) {
            self.finished += 1;
        }

        fn print_interrupted(&mut self) {
            self.interrupted += 1;
        }
    }

    fn conversation(id: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            messages: vec![
                ChatMessage::user("How do I scale?"),
                ChatMessage::assistant("Add replicas."),
            ],
        }
    }

    #[tokio::test]
    async fn streaming_turn_fills_the_placeholder() {
        let backend = FakeBackend::streaming(&[
            "data: {\"chunk\": \"Hello\"}\n",
            "data: {\"chunk\": \" world\"}\n",
            "data: [DONE]\n",
        ]);
        let mut session = ChatSession::with_backend(backend, ChatConfig::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.subscribe(move |state: &ChatState| {
            let last = state.messages().last().map(|m| m.content.clone());
            sink.lock().unwrap().push((state.phase(), last));
        });

        let mut renderer = CaptureRenderer::default();
        let outcome = session
            .send("hi", &mut renderer, CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            ConsumeOutcome::Completed(Completion::Terminator)
        ));
        assert_eq!(renderer.text, "Hello world");
        assert_eq!(renderer.finished, 1);
        assert_eq!(session.state().phase(), TurnPhase::Completed);
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.state().messages()[1].content, "Hello world");

        let seen = seen.lock().unwrap();
        let contents: Vec<_> = seen
            .iter()
            .filter(|(phase, _)| *phase == TurnPhase::Streaming)
            .filter_map(|(_, content)| content.clone())
            .collect();
        assert_eq!(contents, vec!["", "Hello", "Hello world"]);
        assert_eq!(seen.first().map(|(p, _)| *p), Some(TurnPhase::Sent));
        assert_eq!(seen.last().map(|(p, _)| *p), Some(TurnPhase::Completed));

        let requests = session.backend().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 1);
        assert_eq!(requests[0][0].role, Role::User);
    }

    #[tokio::test]
    async fn in_band_error_ends_turn_with_error_text() {
        let backend = FakeBackend::streaming(&[
            "data: {\"chunk\": \"A\"}\n",
            "data: {\"error\": \"boom\"}\n",
        ]);
        let mut session = ChatSession::with_backend(backend, ChatConfig::new());
        let mut renderer = CaptureRenderer::default();
        let outcome = session
            .send("hi", &mut renderer, CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, ConsumeOutcome::Failed(_)));
        assert_eq!(session.state().phase(), TurnPhase::Errored);
        assert_eq!(session.state().messages()[1].content, "Error: boom");
        assert_eq!(renderer.notices, vec!["Error: boom".to_string()]);
        assert_eq!(session.stats().turns_failed, 1);
    }

    #[tokio::test]
    async fn refused_connection_shows_apology() {
        let backend = FakeBackend {
            refuse: true,
            ..FakeBackend::default()
        };
        let mut session = ChatSession::with_backend(backend, ChatConfig::new());
        let mut renderer = CaptureRenderer::default();
        let outcome = session
            .send("hi", &mut renderer, CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, ConsumeOutcome::TransportFailed(_)));
        assert_eq!(
            session.state().messages()[1].content,
            TRANSPORT_FAILURE_MESSAGE
        );
        assert_eq!(session.state().phase(), TurnPhase::Errored);

        // The failed turn does not block the next one.
        assert!(!session.state().is_busy());
    }

    #[tokio::test]
    async fn single_reply_mode() {
        let backend = FakeBackend {
            reply: Some("Use a queue.".to_string()),
            ..FakeBackend::default()
        };
        let mut session =
            ChatSession::with_backend(backend, ChatConfig::new().with_stream(false));
        let mut renderer = CaptureRenderer::default();
        let outcome = session
            .send("how?", &mut renderer, CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(renderer.text, "Use a queue.");
        assert_eq!(session.state().messages()[1].content, "Use a queue.");
        assert_eq!(session.state().messages()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn single_reply_failure_shows_apology() {
        let backend = FakeBackend {
            refuse: true,
            ..FakeBackend::default()
        };
        let mut session =
            ChatSession::with_backend(backend, ChatConfig::new().with_stream(false));
        let mut renderer = CaptureRenderer::default();
        session
            .send("how?", &mut renderer, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(
            session.state().messages()[1].content,
            TRANSPORT_FAILURE_MESSAGE
        );
        assert_eq!(renderer.notices, vec![TRANSPORT_FAILURE_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn cancelled_turn_sends_nothing() {
        let backend = FakeBackend::streaming(&["data: {\"chunk\": \"A\"}\n"]);
        let mut session = ChatSession::with_backend(backend, ChatConfig::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut renderer = CaptureRenderer::default();
        let outcome = session.send("hi", &mut renderer, cancel).await.unwrap();
        assert!(matches!(outcome, ConsumeOutcome::Cancelled));
        assert_eq!(renderer.interrupted, 1);
        assert!(session.backend().requests.lock().unwrap().is_empty());
        assert_eq!(session.state().phase(), TurnPhase::Errored);
        assert_eq!(session.stats().turns_cancelled, 1);
    }

    #[tokio::test]
    async fn dropped_send_does_not_block_the_session() {
        let backend = FakeBackend {
            body: vec!["data: {\"chunk\": \"Half an\"}\n"],
            stall: true,
            ..FakeBackend::default()
        };
        let mut session = ChatSession::with_backend(backend, ChatConfig::new());
        let mut renderer = CaptureRenderer::default();

        let pending = session.send("hi", &mut renderer, CancellationToken::new());
        let timed_out = tokio::time::timeout(Duration::from_millis(50), pending).await;
        assert!(timed_out.is_err());

        assert_eq!(session.state().phase(), TurnPhase::Errored);
        assert_eq!(session.state().messages()[1].content, "Half an");
        assert_eq!(session.stats().turns_cancelled, 1);

        session.clear().unwrap();
        session.backend.stall = false;
        let outcome = session
            .send("again", &mut renderer, CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(session.state().phase(), TurnPhase::Completed);
        assert_eq!(session.message_count(), 2);
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let mut session =
            ChatSession::with_backend(FakeBackend::default(), ChatConfig::new());
        let mut renderer = CaptureRenderer::default();
        let err = session
            .send("   ", &mut renderer, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.message_count(), 0);
        assert!(session.backend().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn readiness_appends_the_assessment() {
        let backend = FakeBackend::streaming(&["data: {\"chunk\": \"ok\"}\n"]);
        let mut session =
            ChatSession::with_backend(backend, ChatConfig::new().with_service("payments"));
        let mut renderer = CaptureRenderer::default();
        session
            .send("hi", &mut renderer, CancellationToken::new())
            .await
            .unwrap();

        let message = session.production_readiness(None).await.unwrap();
        assert_eq!(message.content, "payments is ready");
        let message = session.production_readiness(Some("search")).await.unwrap();
        assert_eq!(message.content, "search is ready");

        assert_eq!(session.message_count(), 4);
        let backend = session.backend();
        assert_eq!(
            *backend.services.lock().unwrap(),
            vec!["payments".to_string(), "search".to_string()]
        );
        assert_eq!(backend.requests.lock().unwrap()[1].len(), 2);
    }

    #[tokio::test]
    async fn conversations_round_trip_through_state() {
        let backend = FakeBackend {
            conversations: vec![conversation("c1"), conversation("c2")],
            ..FakeBackend::default()
        };
        let mut session = ChatSession::with_backend(backend, ChatConfig::new());

        let sessions = session.refresh_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);

        let count = session.load_conversation("c2").await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(session.state().current_session(), Some("c2"));
        assert_eq!(session.state().messages()[1].content, "Add replicas.");

        let confirmation = session.delete_conversation("c2").await.unwrap();
        assert_eq!(confirmation, "Conversation deleted successfully");
        assert!(session.state().current_session().is_none());
        assert_eq!(session.state().sessions().len(), 1);
        assert_eq!(session.message_count(), 0);

        let err = session.load_conversation("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn health_and_stats() {
        let mut session =
            ChatSession::with_backend(FakeBackend::default(), ChatConfig::new());
        assert!(session.health().await.unwrap().is_healthy());
        assert_eq!(session.service_info().await.unwrap().version, "1.0.0");

        session.set_stream(false);
        let stats = session.stats();
        assert!(!stats.stream);
        assert_eq!(stats.service, "web-app");
        assert_eq!(stats.phase, TurnPhase::Idle);
        assert_eq!(stats.message_count, 0);
    }

    #[tokio::test]
    async fn clear_resets_the_conversation() {
        let backend = FakeBackend::streaming(&["data: {\"chunk\": \"ok\"}\n"]);
        let mut session = ChatSession::with_backend(backend, ChatConfig::new());
        let mut renderer = CaptureRenderer::default();
        session
            .send("hi", &mut renderer, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(session.message_count(), 2);
        session.clear().unwrap();
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.state().phase(), TurnPhase::Idle);
    }
}
