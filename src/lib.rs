// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod consumer;
pub mod decoder;
pub mod error;
pub mod observability;
pub mod render;
pub mod sse;
pub mod types;
pub mod utils;

// Re-exports
pub use backend::{ChatBackend, EventStream};
pub use client::ChatClient;
pub use client_logger::ClientLogger;
pub use consumer::{
    ConsumeOutcome, Consumed, MessageObserver, StreamConsumer, TRANSPORT_FAILURE_MESSAGE,
};
pub use decoder::Utf8Decoder;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use types::*;
