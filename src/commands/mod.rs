//! Bot command parsing and response formatting.
//!
//! This module provides the command processing pipeline of the Grumbot bot,
//! letting chat users ask which players are online on a Minecraft server.
//!
//! # Overview
//!
//! 1. **Parsing** - Converting chat messages into structured [`command::Command`] enums
//! 2. **Validation** - Rejecting unknown subcommands and server names
//! 3. **Execution** - Routing commands to their handlers
//! 4. **Response** - Formatting results as Markdown
//!
//! # Architecture
//!
//! ```text
//! Chat Message
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Commander  │  ← Entry point: parse() + parse_command()
//! └─────────────┘
//!      │
//!      ├── parse() ──────────► command::Command
//!      │
//!      └── parse_command() ──► handle_help / handle_list ──► CommandResult
//!                                             │
//!                                             ▼
//!                                      StatusResolver
//! ```
//!
//! # Command Structure
//!
//! All commands follow the format: `!grumbot <subcommand> [args...]`
//!
//! | Command | Arguments | Description |
//! |---------|-----------|-------------|
//! | `help` | None | Display help information |
//! | `list` | `[server] [public]` | List the players online on a server |
//!
//! When `list` is used without a server, the server bound to the channel is
//! used. Replies are private to the sender unless `public` is given.
//!
//! # Error Handling
//!
//! - **Silent Errors** ([`CommandParseError::NotForBot`]): Messages that aren't commands
//!   or are for a different bot. These should not generate responses.
//! - **User Errors** ([`CommandParseError::InvalidCommand`]): Invalid command syntax
//!   or arguments. These include helpful error messages for the user.

mod actions;
mod command;
mod commander;
mod markdown_response;

pub use crate::commands::command::Visibility;
pub use crate::commands::commander::Commander;
use crate::status::Target;

/// Runtime context for command execution.
///
/// # Examples
///
/// ```
/// # use grumbot::commands::CommandContext;
/// let context = CommandContext {
///     channel_target: None,
/// };
/// ```
#[derive(Debug)]
pub struct CommandContext {
    /// Server bound to that channel, if any
    pub channel_target: Option<Target>,
}

/// Result of command execution.
///
/// # Examples
///
/// ```
/// # use grumbot::commands::CommandResult;
/// let result = CommandResult {
///     response: "**No online players**".to_string(),
///     ephemeral: true,
/// };
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Markdown-formatted response message
    pub response: String,
    /// Whether only the sender should see the response
    pub ephemeral: bool,
}

/// Errors that can occur during command parsing.
///
/// # Variants
///
/// * `NotForBot` - Message is not a command or is for a different bot.
///   Should be handled silently without responding to the user.
///
/// * `InvalidCommand` - Command syntax or arguments are invalid.
///   Contains a user-friendly error message to display.
#[derive(Debug)]
pub enum CommandParseError {
    /// Message is not for this bot (silent error)
    NotForBot,
    /// Invalid command syntax with error message
    InvalidCommand(String),
}
