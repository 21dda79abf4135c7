//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the backend.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent as chat turns.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start a new conversation.
    Clear,

    /// Turn streaming replies on or off.
    Stream(bool),

    /// Ask for a production-readiness assessment.
    /// `None` uses the configured service.
    Readiness(Option<String>),

    /// List conversations known to the backend.
    Sessions,

    /// Load a conversation by id.
    Load(String),

    /// Delete a conversation by id.
    Delete(String),

    /// Check backend health.
    Health,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics.
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use architect_chat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/readiness payments").is_some());
/// assert!(parse_command("How should I shard this table?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" | "new" => ChatCommand::Clear,
        "stream" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Stream(value),
            None => ChatCommand::Invalid("/stream expects 'on' or 'off'".to_string()),
        },
        "readiness" => ChatCommand::Readiness(argument.map(|s| s.to_string())),
        "sessions" | "history" => ChatCommand::Sessions,
        "load" => match argument {
            Some(id) => ChatCommand::Load(id.to_string()),
            None => ChatCommand::Invalid("/load requires a conversation id".to_string()),
        },
        "delete" => match argument {
            Some(id) => ChatCommand::Delete(id.to_string()),
            None => ChatCommand::Invalid("/delete requires a conversation id".to_string()),
        },
        "health" => ChatCommand::Health,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "config" => ChatCommand::ShowConfig,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /clear                 Start a new conversation
  /stream on|off         Stream replies or wait for whole replies
  /readiness [service]   Assess a service for production readiness
  /sessions              List saved conversations
  /load <id>             Load a saved conversation
  /delete <id>           Delete a saved conversation
  /health                Check the backend
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat

Press Ctrl-C while a reply is streaming to stop it."#
}
