use std::fmt;

/// Why a stream ended successfully.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Completion {
    /// A `data: [DONE]` record was read.
    Terminator,

    /// A `{"done": true}` payload was read.
    DoneFlag,

    /// The body ended without an explicit termination record.
    EndOfStream,
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Terminator => write!(f, "terminator"),
            Completion::DoneFlag => write!(f, "done"),
            Completion::EndOfStream => write!(f, "end_of_stream"),
        }
    }
}

/// An event produced while reading a streamed chat response.
///
/// A well-formed stream yields zero or more `Chunk`s followed by exactly one
/// `Done`.  In-band and transport errors are yielded as `Err` and end the
/// stream instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental text fragment, in arrival order.
    Chunk(String),

    /// The stream completed successfully.
    Done(Completion),
}

impl StreamEvent {
    /// Returns the text fragment, if this is a chunk.
    pub fn as_chunk(&self) -> Option<&str> {
        match self {
            StreamEvent::Chunk(text) => Some(text),
            StreamEvent::Done(_) => None,
        }
    }
}
