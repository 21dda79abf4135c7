//! Incremental UTF-8 decoding of a chunked response body.
//!
//! Network reads are not aligned to character boundaries: a multi-byte
//! character may begin at the end of one chunk and finish at the start of the
//! next.  [`Utf8Decoder`] holds back such an incomplete tail until the rest
//! arrives.  Invalid sequences decode to U+FFFD rather than failing the
//! stream.

use std::str;

/// The replacement character emitted for invalid input.
pub const REPLACEMENT: char = '\u{FFFD}';

/// A stateful UTF-8 decoder.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with no buffered input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk of bytes.
    ///
    /// Returns every complete character available so far.  An incomplete
    /// trailing sequence is kept for the next call.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut output = String::with_capacity(input.len());
        let mut rest = &input[..];
        loop {
            match str::from_utf8(rest) {
                Ok(valid) => {
                    output.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // valid_up_to() guarantees this prefix decodes.
                    output.push_str(str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            output.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        output
    }

    /// Flush the decoder at end of input.
    ///
    /// A sequence that never completed becomes a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Returns the number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
