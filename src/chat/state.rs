//! Explicit chat state and its transitions.
//!
//! [`ChatState`] holds everything the user interface shows: the known
//! sessions, the selected session, the message list and the phase of the
//! current turn.  Every change goes through a transition method that either
//! applies completely or returns an error and leaves the state untouched.

use crate::consumer::{ConsumeOutcome, Consumed};
use crate::error::{Error, Result};
use crate::observability::{TURNS_REJECTED, TURNS_STARTED};
use crate::types::{ChatMessage, Session};

/// Where the current turn stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn has been started since the last reset.
    #[default]
    Idle,
    /// The user message is recorded and the request is on its way.
    Sent,
    /// Reply fragments are arriving.
    Streaming,
    /// The last turn finished normally.
    Completed,
    /// The last turn failed or was cancelled.
    Errored,
}

impl TurnPhase {
    /// Returns true while a request is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TurnPhase::Sent | TurnPhase::Streaming)
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TurnPhase::Idle => "idle",
            TurnPhase::Sent => "sent",
            TurnPhase::Streaming => "streaming",
            TurnPhase::Completed => "completed",
            TurnPhase::Errored => "errored",
        };
        write!(f, "{s}")
    }
}

/// Notified after every state transition.
pub trait StateObserver: Send {
    /// Called with the state as it reads after the transition.
    fn on_state_change(&mut self, state: &ChatState);
}

impl<F> StateObserver for F
where
    F: FnMut(&ChatState) + Send,
{
    fn on_state_change(&mut self, state: &ChatState) {
        self(state)
    }
}

/// The state of one chat window.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    sessions: Vec<Session>,
    current_session: Option<String>,
    messages: Vec<ChatMessage>,
    phase: TurnPhase,
}

impl ChatState {
    /// An idle state with no messages and no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Known sessions, in the order the backend listed them.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The id of the selected session, if any.
    pub fn current_session(&self) -> Option<&str> {
        self.current_session.as_deref()
    }

    /// The messages of the current conversation.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The phase of the current turn.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Returns true while a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.phase.is_in_flight()
    }

    /// The assistant message the current turn is writing into.
    pub fn placeholder(&self) -> Option<&ChatMessage> {
        if self.is_busy() {
            self.messages.last()
        } else {
            None
        }
    }

    /// The messages to send for the current turn.
    ///
    /// While a turn is in flight the trailing placeholder is left out.
    pub fn request_history(&self) -> Vec<ChatMessage> {
        let end = if self.is_busy() {
            self.messages.len().saturating_sub(1)
        } else {
            self.messages.len()
        };
        self.messages[..end].to_vec()
    }

    /// Start a turn for `text`.
    ///
    /// Appends the user message and a single empty assistant placeholder.
    pub fn begin_turn(&mut self, text: &str) -> Result<()> {
        if self.is_busy() {
            TURNS_REJECTED.click();
            return Err(Error::busy("a reply is still in progress"));
        }
        let text = text.trim();
        if text.is_empty() {
            TURNS_REJECTED.click();
            return Err(Error::validation(
                "message must not be empty",
                Some("text".to_string()),
            ));
        }
        TURNS_STARTED.click();
        self.messages.push(ChatMessage::user(text));
        self.messages.push(ChatMessage::placeholder());
        self.phase = TurnPhase::Sent;
        Ok(())
    }

    /// Mark the response body as started.
    pub fn streaming(&mut self) -> Result<()> {
        match self.phase {
            TurnPhase::Sent | TurnPhase::Streaming => {
                self.phase = TurnPhase::Streaming;
                Ok(())
            }
            phase => Err(Error::validation(
                format!("cannot start streaming while {phase}"),
                None,
            )),
        }
    }

    /// Replace the placeholder with a newer snapshot.
    pub fn update_placeholder(&mut self, snapshot: ChatMessage) -> Result<()> {
        if !self.is_busy() {
            return Err(Error::validation(
                format!("no reply in progress ({})", self.phase),
                None,
            ));
        }
        match self.messages.last_mut() {
            Some(last) => {
                *last = snapshot;
                Ok(())
            }
            None => Err(Error::validation("no placeholder to update", None)),
        }
    }

    /// Finish the current turn with the consumer's final message.
    pub fn finish_turn(&mut self, consumed: &Consumed) -> Result<()> {
        self.update_placeholder(consumed.message.clone())?;
        self.phase = match consumed.outcome {
            ConsumeOutcome::Completed(_) => TurnPhase::Completed,
            ConsumeOutcome::Failed(_)
            | ConsumeOutcome::TransportFailed(_)
            | ConsumeOutcome::Cancelled => TurnPhase::Errored,
        };
        Ok(())
    }

    /// Give up on the turn in flight without a final message.
    ///
    /// The placeholder keeps whatever text had arrived.  Returns false if no
    /// turn was in flight.
    pub fn abandon_turn(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        self.phase = TurnPhase::Errored;
        true
    }

    /// Append a reply that did not come from a turn, such as an assessment.
    pub fn push_reply(&mut self, message: ChatMessage) -> Result<()> {
        self.ensure_idle()?;
        self.messages.push(message);
        Ok(())
    }

    /// Start a new conversation.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.messages.clear();
        self.current_session = None;
        self.phase = TurnPhase::Idle;
        Ok(())
    }

    /// Replace the session list.
    pub fn set_sessions(&mut self, sessions: Vec<Session>) {
        self.sessions = sessions;
    }

    /// Switch to session `id` and show `messages`.
    pub fn select_session(
        &mut self,
        id: impl Into<String>,
        messages: Vec<ChatMessage>,
    ) -> Result<()> {
        self.ensure_idle()?;
        let id = id.into();
        let count = messages.len();
        if let Some(session) = self.sessions.iter_mut().find(|s| s.id == id) {
            session.message_count = count;
        }
        self.current_session = Some(id);
        self.messages = messages;
        self.phase = TurnPhase::Idle;
        Ok(())
    }

    /// Forget session `id`.
    ///
    /// Returns true if the removed session was the selected one; the
    /// conversation is then reset.
    pub fn remove_session(&mut self, id: &str) -> Result<bool> {
        let was_current = self.current_session.as_deref() == Some(id);
        if was_current {
            self.reset()?;
        }
        self.sessions.retain(|s| s.id != id);
        Ok(was_current)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            Err(Error::busy("a reply is still in progress"))
        } else {
            Ok(())
        }
    }
}
