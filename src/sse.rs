//! Record framing for streamed chat responses.
//!
//! The streaming endpoint answers with newline-delimited records of the form
//! `data: <payload>`.  This module turns the raw byte stream of such a
//! response into a stream of [`StreamEvent`]s, handling decoding, line
//! reassembly across network reads, record classification and termination.

use std::collections::VecDeque;
use std::error;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::decoder::Utf8Decoder;
use crate::observability::{
    STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS, STREAM_MALFORMED_RECORDS, STREAM_RECORDS,
};
use crate::{Completion, DATA_PREFIX, Error, Result, StreamEvent, StreamFrame, StreamPayload};

/// What a single record means for the read loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// Empty or whitespace-only; ignored.
    Blank,
    /// A record without the `data: ` prefix; reserved and ignored.
    Unprefixed,
    /// A `data: ` record whose content could not be parsed; skipped.
    Malformed(String),
    /// A `data: ` record carrying a frame.
    Frame(StreamFrame),
}

impl Record {
    /// Classify one line of the response body (without its newline).
    pub fn classify(line: &str) -> Self {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return Record::Blank;
        }
        let Some(content) = line.strip_prefix(DATA_PREFIX) else {
            return Record::Unprefixed;
        };
        match StreamFrame::parse(content) {
            Ok(frame) => Record::Frame(frame),
            Err(err) => Record::Malformed(err.to_string()),
        }
    }
}

/// Splits decoded text into newline-terminated lines.
///
/// Text after the last newline is held until more text arrives or the
/// input ends, so a record split across reads comes out whole.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    partial: String,
}

impl LineBuffer {
    /// Create an empty line buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text, returning every line it completes.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.partial.push_str(text);
        let Some(last_newline) = self.partial.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, rest);
        complete
            .split_terminator('\n')
            .map(str::to_string)
            .collect()
    }

    /// Take whatever unterminated text remains at end of input.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.partial))
        }
    }
}

/// What the read loop does after applying one record.
enum Step {
    Continue,
    Emit(Result<StreamEvent>),
    Stop(Result<StreamEvent>),
}

fn apply_record(line: &str) -> Step {
    match Record::classify(line) {
        Record::Blank | Record::Unprefixed => Step::Continue,
        Record::Malformed(reason) => {
            STREAM_RECORDS.click();
            STREAM_MALFORMED_RECORDS.click();
            log::warn!("skipping malformed stream record: {reason}");
            Step::Continue
        }
        Record::Frame(frame) => {
            STREAM_RECORDS.click();
            match frame {
                StreamFrame::Terminator => {
                    log::debug!("stream terminator received");
                    Step::Stop(Ok(StreamEvent::Done(Completion::Terminator)))
                }
                StreamFrame::Payload(StreamPayload::Chunk(text)) => {
                    STREAM_CHUNKS.click();
                    Step::Emit(Ok(StreamEvent::Chunk(text)))
                }
                StreamFrame::Payload(StreamPayload::Done) => {
                    log::debug!("stream done flag received");
                    Step::Stop(Ok(StreamEvent::Done(Completion::DoneFlag)))
                }
                StreamFrame::Payload(StreamPayload::Error(message)) => {
                    STREAM_ERRORS.click();
                    log::warn!("backend reported a stream error: {message}");
                    Step::Stop(Err(Error::upstream(message)))
                }
            }
        }
    }
}

struct ReadState<S> {
    body: S,
    decoder: Utf8Decoder,
    lines: LineBuffer,
    queue: VecDeque<String>,
    eof: bool,
    finished: bool,
}

impl<S> ReadState<S> {
    fn ingest(&mut self, text: &str) {
        self.queue.extend(self.lines.push(text));
    }
}

/// Process a response body into a stream of chat events.
///
/// The returned stream yields `Chunk`s in arrival order and ends after the
/// first of:
///
/// - a record containing `[DONE]`, yielding `Done(Completion::Terminator)`;
/// - a `{"done": true}` payload, yielding `Done(Completion::DoneFlag)`;
/// - a `{"error": ...}` payload, yielding `Err(Error::Upstream)`;
/// - a failure reading the body, yielding `Err(Error::Streaming)`;
/// - the end of the body, yielding `Done(Completion::EndOfStream)`.
///
/// Records already buffered behind a terminating record are never looked at.
/// Malformed records are logged and skipped.
pub fn process_stream<S, E>(body: S) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: error::Error + Send + Sync + 'static,
{
    let state = ReadState {
        body,
        decoder: Utf8Decoder::new(),
        lines: LineBuffer::new(),
        queue: VecDeque::new(),
        eof: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        loop {
            // Drain complete records before reading more of the body.
            while let Some(line) = state.queue.pop_front() {
                match apply_record(&line) {
                    Step::Continue => {}
                    Step::Emit(event) => return Some((event, state)),
                    Step::Stop(event) => {
                        state.finished = true;
                        state.queue.clear();
                        return Some((event, state));
                    }
                }
            }

            if state.eof {
                state.finished = true;
                return Some((Ok(StreamEvent::Done(Completion::EndOfStream)), state));
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    let text = state.decoder.decode(&bytes);
                    state.ingest(&text);
                }
                Some(Err(err)) => {
                    STREAM_ERRORS.click();
                    state.finished = true;
                    let err = Error::streaming(
                        format!("Error in HTTP stream: {err}"),
                        Some(Box::new(err)),
                    );
                    return Some((Err(err), state));
                }
                None => {
                    let tail = state.decoder.finish();
                    state.ingest(&tail);
                    if let Some(rest) = state.lines.finish() {
                        state.queue.push_back(rest);
                    }
                    state.eof = true;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn body(
        chunks: &[&'static str],
    ) -> impl Stream<Item = std::result::Result<Bytes, io::Error>> + Unpin + use<> {
        stream::iter(
            chunks
                .iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect<S>(stream: S) -> Vec<Result<StreamEvent>>
    where
        S: Stream<Item = Result<StreamEvent>>,
    {
        stream.collect::<Vec<_>>().await
    }

    fn chunks_of(events: &[Result<StreamEvent>]) -> String {
        events
            .iter()
            .filter_map(|event| event.as_ref().ok().and_then(StreamEvent::as_chunk))
            .collect()
    }

    #[test]
    fn classify_records() {
        assert_eq!(Record::classify(""), Record::Blank);
        assert_eq!(Record::classify("   \t"), Record::Blank);
        assert_eq!(Record::classify("random text"), Record::Unprefixed);
        assert_eq!(Record::classify("event: ping"), Record::Unprefixed);
        assert_eq!(
            Record::classify("data: [DONE]"),
            Record::Frame(StreamFrame::Terminator)
        );
        assert_eq!(
            Record::classify("data: {\"chunk\":\"x\"}\r"),
            Record::Frame(StreamFrame::Payload(StreamPayload::Chunk("x".to_string())))
        );
        assert!(matches!(
            Record::classify("data: not-json"),
            Record::Malformed(_)
        ));
        // The prefix includes the space.
        assert_eq!(Record::classify("data:{\"chunk\":\"x\"}"), Record::Unprefixed);
    }

    #[test]
    fn line_buffer_reassembles() {
        let mut lines = LineBuffer::new();
        assert!(lines.push("data: {\"ch").is_empty());
        assert_eq!(lines.push("unk\":\"A\"}\ndata"), vec!["data: {\"chunk\":\"A\"}"]);
        assert_eq!(lines.push(": x\n\n"), vec!["data: x", ""]);
        assert_eq!(lines.finish(), None);
        lines.push("tail");
        assert_eq!(lines.finish(), Some("tail".to_string()));
    }

    #[tokio::test]
    async fn chunks_in_order() {
        let events = collect(process_stream(body(&[
            "data: {\"chunk\":\"Hel\"}\n\n",
            "data: {\"chunk\":\"lo\"}\n\ndata: [DONE]\n\n",
        ])))
        .await;
        assert_eq!(chunks_of(&events), "Hello");
        assert!(matches!(
            events.last(),
            Some(Ok(StreamEvent::Done(Completion::Terminator)))
        ));
    }

    #[tokio::test]
    async fn malformed_record_is_skipped() {
        let events = collect(process_stream(body(&[
            "data: {\"chunk\":\"A\"}\n",
            "data: not-json\n",
            "data: {\"chunk\":\"B\"}\n",
        ])))
        .await;
        assert_eq!(chunks_of(&events), "AB");
        assert!(events.iter().all(|event| event.is_ok()));
        assert!(matches!(
            events.last(),
            Some(Ok(StreamEvent::Done(Completion::EndOfStream)))
        ));
    }

    #[tokio::test]
    async fn blank_and_unprefixed_lines_are_ignored() {
        let events = collect(process_stream(body(&[
            "\n",
            "random text\n",
            "data: {\"chunk\":\"X\"}\n",
        ])))
        .await;
        assert_eq!(chunks_of(&events), "X");
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn terminator_stops_before_buffered_records() {
        let events = collect(process_stream(body(&[
            "data: {\"chunk\":\"A\"}\ndata: [DONE]\ndata: {\"chunk\":\"B\"}\n",
        ])))
        .await;
        assert_eq!(chunks_of(&events), "A");
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn done_flag_stops_before_buffered_records() {
        let events = collect(process_stream(body(&[
            "data: {\"chunk\":\"A\"}\ndata: {\"done\": true}\ndata: {\"chunk\":\"B\"}\n",
            "data: {\"chunk\":\"C\"}\n",
        ])))
        .await;
        assert_eq!(chunks_of(&events), "A");
        assert!(matches!(
            events.last(),
            Some(Ok(StreamEvent::Done(Completion::DoneFlag)))
        ));
    }

    #[tokio::test]
    async fn error_payload_ends_stream() {
        let events = collect(process_stream(body(&[
            "data: {\"chunk\":\"A\"}\n",
            "data: {\"error\":\"boom\"}\n",
            "data: {\"chunk\":\"B\"}\n",
        ])))
        .await;
        assert_eq!(events.len(), 2);
        match &events[1] {
            Err(err) => {
                assert!(err.is_upstream());
                assert!(err.to_string().contains("boom"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn record_split_mid_json_and_mid_character() {
        let wire = "data: {\"chunk\":\"héllo \"}\ndata: {\"chunk\":\"🦀\"}\ndata: [DONE]\n";
        let bytes = wire.as_bytes();
        for split in 0..=bytes.len() {
            let (first, second) = bytes.split_at(split);
            let body = stream::iter(vec![
                Ok::<_, io::Error>(Bytes::copy_from_slice(first)),
                Ok(Bytes::copy_from_slice(second)),
            ]);
            let events = collect(process_stream(body)).await;
            assert_eq!(chunks_of(&events), "héllo 🦀", "split at {split}");
        }
    }

    #[tokio::test]
    async fn unterminated_final_record_is_processed() {
        let events = collect(process_stream(body(&["data: {\"chunk\":\"end\"}"]))).await;
        assert_eq!(chunks_of(&events), "end");
    }

    #[tokio::test]
    async fn body_error_ends_stream() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"chunk\":\"A\"}\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"data: {\"chunk\":\"B\"}\n")),
        ]);
        let events = collect(process_stream(body)).await;
        assert_eq!(chunks_of(&events), "A");
        assert!(matches!(events.last(), Some(Err(Error::Streaming { .. }))));
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_not_reported() {
        let body = stream::iter(vec![Ok::<_, io::Error>(Bytes::from_static(
            b"data: {\"chunk\":\"a\xffb\"}\n",
        ))]);
        let events = collect(process_stream(body)).await;
        assert!(events.iter().all(Result::is_ok));
        assert_eq!(chunks_of(&events), "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn empty_body_completes() {
        let events = collect(process_stream(body(&[]))).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Ok(StreamEvent::Done(Completion::EndOfStream))
        ));
    }
}
