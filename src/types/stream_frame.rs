use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Prefix that marks a record carrying a frame.
pub const DATA_PREFIX: &str = "data: ";

/// Literal token that ends a stream.
pub const TERMINATOR: &str = "[DONE]";

/// The structured payload of a `data: ` record.
///
/// On the wire this is a loosely-typed object with one of the fields
/// `chunk`, `done` or `error`.  Exactly one of the three shapes must match;
/// an object carrying none of them, or more than one, is rejected.  Unknown
/// extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum StreamPayload {
    /// `{"chunk": "..."}`: a text fragment to append.
    Chunk(String),

    /// `{"done": true}`: end of stream.
    Done,

    /// `{"error": "..."}`: the backend failed; terminal for the request.
    Error(String),
}

impl StreamPayload {
    /// Builds a payload from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(object) = value else {
            return Err(Error::serialization(
                "stream payload is not a JSON object",
                None,
            ));
        };
        let mut matched = Vec::with_capacity(1);
        if let Some(chunk) = object.get("chunk") {
            matched.push(match chunk {
                Value::String(text) => StreamPayload::Chunk(text.clone()),
                _ => return Err(malformed("chunk", "a string")),
            });
        }
        if let Some(done) = object.get("done") {
            matched.push(match done {
                Value::Bool(true) => StreamPayload::Done,
                _ => return Err(malformed("done", "true")),
            });
        }
        if let Some(error) = object.get("error") {
            matched.push(match error {
                Value::String(text) => StreamPayload::Error(text.clone()),
                _ => return Err(malformed("error", "a string")),
            });
        }
        match matched.len() {
            1 => Ok(matched.remove(0)),
            0 => Err(Error::serialization(
                "stream payload has none of chunk, done or error",
                None,
            )),
            _ => Err(Error::serialization(
                "stream payload mixes chunk, done and error",
                None,
            )),
        }
    }

    /// Parses the text after the `data: ` prefix as a payload.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Renders the payload as a complete wire record, newline included.
    pub fn to_record(&self) -> String {
        format!("{DATA_PREFIX}{}\n", Value::from(self.clone()))
    }
}

fn malformed(field: &str, expected: &str) -> Error {
    Error::serialization(
        format!("stream payload field `{field}` must be {expected}"),
        None,
    )
}

impl TryFrom<Value> for StreamPayload {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<StreamPayload> for Value {
    fn from(payload: StreamPayload) -> Self {
        let mut object = Map::new();
        match payload {
            StreamPayload::Chunk(text) => {
                object.insert("chunk".to_string(), Value::String(text));
            }
            StreamPayload::Done => {
                object.insert("done".to_string(), Value::Bool(true));
            }
            StreamPayload::Error(text) => {
                object.insert("error".to_string(), Value::String(text));
            }
        }
        Value::Object(object)
    }
}

/// One decoded `data: ` record, prefix already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// The record contained the terminator token.
    Terminator,

    /// The record carried a structured payload.
    Payload(StreamPayload),
}

impl StreamFrame {
    /// Classifies the content of a record.
    ///
    /// The terminator check runs before any JSON parsing and matches the
    /// token anywhere in the content.
    pub fn parse(content: &str) -> Result<Self> {
        if content.contains(TERMINATOR) {
            return Ok(StreamFrame::Terminator);
        }
        StreamPayload::parse(content).map(StreamFrame::Payload)
    }
}
