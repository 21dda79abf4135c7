//! Chat application module for conversations with the architect backend.
//!
//! This module provides a REPL chat interface built on top of the
//! architect-chat client library. It supports:
//!
//! - Streaming replies with incremental display
//! - Cancelling a reply in progress
//! - Slash commands for session control
//! - Saved conversations kept by the backend
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`state`]: the chat state and its transitions
//! - [`session`]: drives turns against a backend
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;
mod state;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ChatConfigFile, DEFAULT_SERVICE};
pub use session::{ChatSession, SessionStats};
pub use state::{ChatState, StateObserver, TurnPhase};
