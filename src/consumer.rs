//! The streaming response consumer.
//!
//! [`StreamConsumer`] reads [`StreamEvent`]s for one assistant turn and folds
//! them into the turn's placeholder message.  Every accepted fragment
//! produces a new [`ChatMessage`] snapshot whose content is the
//! concatenation of all fragments so far; observers see each snapshot before
//! the next chunk of the body is requested.
//!
//! Failures never escape as `Err`: the outcome is reported in
//! [`ConsumeOutcome`] and reflected in the final message content.

use std::pin::pin;
use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::observability::{STREAM_DURATION, TURNS_CANCELLED};
use crate::sse::process_stream;
use crate::types::{ChatMessage, Completion, StreamEvent};

/// Content shown in place of the reply when the backend cannot be reached.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Receives every snapshot of the message being streamed.
pub trait MessageObserver: Send {
    /// Called after each accepted fragment.
    ///
    /// `snapshot` is the whole message as it now reads; `fragment` is the
    /// text that was just appended.  Called with an empty fragment when the
    /// content is replaced by a failure notice.
    fn on_snapshot(&mut self, snapshot: &ChatMessage, fragment: &str);
}

impl<F> MessageObserver for F
where
    F: FnMut(&ChatMessage, &str) + Send,
{
    fn on_snapshot(&mut self, snapshot: &ChatMessage, fragment: &str) {
        self(snapshot, fragment)
    }
}

/// How a consumed stream ended.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    /// The stream ended normally.
    Completed(Completion),
    /// The backend sent `{"error": ...}`.
    Failed(Error),
    /// The request or the body failed in transit.
    TransportFailed(Error),
    /// The cancellation token fired.
    Cancelled,
}

impl ConsumeOutcome {
    /// Returns true if the turn completed successfully.
    pub fn is_completed(&self) -> bool {
        matches!(self, ConsumeOutcome::Completed(_))
    }

    /// The failure reason, for outcomes that carry one.
    pub fn error(&self) -> Option<&Error> {
        match self {
            ConsumeOutcome::Failed(err) | ConsumeOutcome::TransportFailed(err) => Some(err),
            ConsumeOutcome::Completed(_) | ConsumeOutcome::Cancelled => None,
        }
    }
}

/// The final message of a consumed stream and how the stream ended.
#[derive(Debug, Clone)]
pub struct Consumed {
    /// The last snapshot of the assistant message.
    pub message: ChatMessage,
    /// How the stream ended.
    pub outcome: ConsumeOutcome,
}

impl Consumed {
    /// A turn that failed before or while talking to the backend.
    ///
    /// The message content is replaced with [`TRANSPORT_FAILURE_MESSAGE`].
    pub fn transport_failure(message: &ChatMessage, err: Error) -> Self {
        log::warn!("chat request failed: {err}");
        Self {
            message: message.snapshot(TRANSPORT_FAILURE_MESSAGE),
            outcome: ConsumeOutcome::TransportFailed(err),
        }
    }

    /// A turn that the backend failed in-band.
    ///
    /// Text streamed before the error is discarded; the message reads
    /// `Error: <backend text>`.
    pub fn upstream_failure(message: &ChatMessage, err: Error) -> Self {
        let text = match &err {
            Error::Upstream { message: text } => text.clone(),
            other => other.to_string(),
        };
        Self {
            message: message.snapshot(format!("Error: {text}")),
            outcome: ConsumeOutcome::Failed(err),
        }
    }
}

/// Folds a stream of chat events into a single assistant message.
#[derive(Debug, Clone)]
pub struct StreamConsumer {
    cancel: CancellationToken,
    cooperative: bool,
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamConsumer {
    /// Create a consumer that yields to the scheduler after every fragment
    /// and can never be cancelled.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            cooperative: true,
        }
    }

    /// Stop consuming when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Do not yield to the scheduler between fragments.
    ///
    /// Useful when the observer renders synchronously on another thread.
    pub fn without_yield(mut self) -> Self {
        self.cooperative = false;
        self
    }

    /// The token that cancels this consumer.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Consume a raw response body.
    ///
    /// Equivalent to [`consume`](Self::consume) over
    /// [`process_stream`](crate::sse::process_stream)`(body)`.
    pub async fn consume_body<B, E>(
        &self,
        body: B,
        placeholder: ChatMessage,
        observer: &mut dyn MessageObserver,
    ) -> Consumed
    where
        B: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
        E: std::error::Error + Send + Sync + 'static,
    {
        let events = pin!(process_stream(body));
        self.consume(events, placeholder, observer).await
    }

    /// Consume a stream of events into `placeholder`.
    ///
    /// Fragments are applied strictly in arrival order.  The consumer stops at
    /// the first terminal event, at the end of the stream, or when the
    /// cancellation token fires while waiting for the next event.
    pub async fn consume<S>(
        &self,
        mut events: S,
        placeholder: ChatMessage,
        observer: &mut dyn MessageObserver,
    ) -> Consumed
    where
        S: Stream<Item = Result<StreamEvent>> + Unpin,
    {
        let start = Instant::now();
        let mut accumulated = String::new();
        let mut message = placeholder;

        let consumed = loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    TURNS_CANCELLED.click();
                    log::debug!("stream cancelled after {} bytes", accumulated.len());
                    break Consumed {
                        message,
                        outcome: ConsumeOutcome::Cancelled,
                    };
                }
                next = events.next() => next,
            };

            match next {
                Some(Ok(StreamEvent::Chunk(fragment))) => {
                    accumulated.push_str(&fragment);
                    message = message.snapshot(accumulated.as_str());
                    observer.on_snapshot(&message, &fragment);
                    if self.cooperative {
                        tokio::task::yield_now().await;
                    }
                }
                Some(Ok(StreamEvent::Done(completion))) => {
                    break Consumed {
                        message,
                        outcome: ConsumeOutcome::Completed(completion),
                    };
                }
                None => {
                    break Consumed {
                        message,
                        outcome: ConsumeOutcome::Completed(Completion::EndOfStream),
                    };
                }
                Some(Err(err)) if err.is_upstream() => {
                    let failed = Consumed::upstream_failure(&message, err);
                    observer.on_snapshot(&failed.message, "");
                    break failed;
                }
                Some(Err(err)) => {
                    let failed = Consumed::transport_failure(&message, err);
                    observer.on_snapshot(&failed.message, "");
                    break failed;
                }
            }
        };

        STREAM_DURATION.add(start.elapsed().as_secs_f64());
        consumed
    }
}
