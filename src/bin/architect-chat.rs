//! Interactive chat application for the Solution Architect backend.
//!
//! This binary provides a streaming REPL interface for asking the backend
//! architecture questions.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! architect-chat
//!
//! # Talk to another backend
//! architect-chat --base-url http://architect.internal:8000/
//!
//! # Wait for whole replies instead of streaming
//! architect-chat --no-stream
//!
//! # Read settings from a file
//! architect-chat --config architect-chat.yaml
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Start a new conversation
//! - `/readiness [service]` - Assess a service for production readiness
//! - `/sessions` - List saved conversations
//! - `/quit` - Exit the application
//!
//! Press Ctrl-C while a reply is streaming to stop it.

use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use flexi_logger::Logger;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;

use architect_chat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use architect_chat::{ChatMessage, Role};

/// Main entry point for the architect-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = Logger::try_with_env_or_str("warn")?
        .log_to_stderr()
        .start()?;

    let (args, _) = ChatArgs::from_command_line_relaxed("architect-chat [OPTIONS]");
    let config = ChatConfig::load(args)?;
    let use_color = config.use_color;

    let mut session = ChatSession::new(config)?;
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Token of the turn in flight; Ctrl-C cancels it.
    let in_flight = Arc::new(Mutex::new(CancellationToken::new()));
    let handler_slot = Arc::clone(&in_flight);
    ctrlc::set_handler(move || {
        if let Ok(token) = handler_slot.lock() {
            token.cancel();
        }
    })?;

    println!(
        "Solution Architect chat ({})",
        session.backend().base_url()
    );
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => match session.clear() {
                            Ok(()) => renderer.print_info("Started a new conversation."),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Stream(on) => {
                            session.set_stream(on);
                            if on {
                                renderer.print_info("Streaming replies enabled.");
                            } else {
                                renderer.print_info("Streaming replies disabled.");
                            }
                        }
                        ChatCommand::Readiness(service) => {
                            match session.production_readiness(service.as_deref()).await {
                                Ok(message) => {
                                    renderer.start_response();
                                    renderer.print_text(&message.content);
                                    renderer.finish_response();
                                }
                                Err(err) => renderer
                                    .print_error(&format!("Readiness check failed: {}", err)),
                            }
                        }
                        ChatCommand::Sessions => match session.refresh_sessions().await {
                            Ok(sessions) if sessions.is_empty() => {
                                renderer.print_info("No saved conversations.")
                            }
                            Ok(sessions) => {
                                println!("    Conversations:");
                                for s in sessions {
                                    println!(
                                        "      {}  {}  {}",
                                        s.id,
                                        s.title,
                                        s.timestamp.as_deref().unwrap_or("")
                                    );
                                    if !s.preview.is_empty() {
                                        println!("        {}", s.preview);
                                    }
                                }
                            }
                            Err(err) => renderer
                                .print_error(&format!("Failed to list conversations: {}", err)),
                        },
                        ChatCommand::Load(id) => match session.load_conversation(&id).await {
                            Ok(count) => {
                                print_transcript(session.state().messages());
                                renderer.print_info(&format!(
                                    "Loaded conversation {id} ({count} messages)."
                                ));
                            }
                            Err(err) => renderer
                                .print_error(&format!("Failed to load conversation: {}", err)),
                        },
                        ChatCommand::Delete(id) => match session.delete_conversation(&id).await {
                            Ok(confirmation) => renderer.print_info(&confirmation),
                            Err(err) => renderer
                                .print_error(&format!("Failed to delete conversation: {}", err)),
                        },
                        ChatCommand::Health => match session.health().await {
                            Ok(health) => {
                                let version = session
                                    .service_info()
                                    .await
                                    .map(|info| info.version)
                                    .unwrap_or_else(|_| "unknown".to_string());
                                renderer.print_info(&format!(
                                    "Backend {} (version {}) at {}",
                                    health.status, version, health.timestamp
                                ));
                            }
                            Err(err) => {
                                renderer.print_error(&format!("Health check failed: {}", err))
                            }
                        },
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the backend
                let cancel = CancellationToken::new();
                if let Ok(mut slot) = in_flight.lock() {
                    *slot = cancel.clone();
                }
                if let Err(e) = session.send(line, &mut renderer, cancel).await {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_transcript(messages: &[ChatMessage]) {
    for message in messages {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Architect",
        };
        println!("{speaker}: {}\n", message.content);
    }
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Conversation: {}",
        stats.current_session.as_deref().unwrap_or("(new)")
    );
    println!("      Known conversations: {}", stats.session_count);
    println!("      Turn: {}", stats.phase);
    println!(
        "      Turns: {} completed / {} failed / {} cancelled",
        stats.turns_completed, stats.turns_failed, stats.turns_cancelled
    );
    println!("      Characters received: {}", stats.chars_received);
}

fn print_config(session: &ChatSession) {
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Backend: {}", session.backend().base_url());
    println!(
        "      Streaming: {}",
        if config.stream { "on" } else { "off" }
    );
    println!(
        "      Request timeout: {}s",
        session.backend().timeout().as_secs()
    );
    println!("      Readiness service: {}", config.service);
    println!(
        "      Color: {}",
        if config.use_color { "on" } else { "off" }
    );
}
