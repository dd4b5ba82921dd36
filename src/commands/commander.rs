//! Command orchestration and execution.
//!
//! This module provides the [`Commander`] struct, which serves as the main entry point
//! for processing bot commands. It coordinates command parsing and execution, routing
//! commands to their appropriate handlers.
//!
//! # Flow
//!
//! ```text
//! Chat Message → parse() → Command → parse_command() → CommandResult
//! ```

use command_parser::Parser;

use crate::{
    commands::{
        CommandContext, CommandParseError, CommandResult,
        actions::{handle_help, handle_list},
        command::{Command, format_command_error},
    },
    status::{Requester, StatusResolver},
};

/// Main command processor for the Grumbot bot.
///
/// The `Commander` parses chat messages and executes them, using its
/// [`StatusResolver`] to answer `list` commands.
///
/// # Command Prefix
///
/// All commands must start with the `!grumbot` prefix. Messages without this prefix
/// are silently ignored (returning [`CommandParseError::NotForBot`]).
pub struct Commander<R: Requester> {
    /// Command parser for processing user commands
    parser: Parser,
    /// Resolver answering `list` commands
    resolver: StatusResolver<R>,
}

impl<R: Requester> Commander<R> {
    /// Creates a new Commander instance with a configured command parser.
    ///
    /// The parser is configured to recognize commands starting with `!` as the command
    /// prefix and `-` as the option prefix.
    pub fn new(resolver: StatusResolver<R>) -> Self {
        let parser = Parser::new('!', '-');
        Commander { parser, resolver }
    }

    /// Parses a chat message body into a structured command.
    ///
    /// # Returns
    ///
    /// * `Ok(Command)` - Successfully parsed and validated command
    /// * `Err(CommandParseError::NotForBot)` - Message is not a command or for a different bot
    /// * `Err(CommandParseError::InvalidCommand)` - Command syntax is invalid
    pub fn parse(&self, body: &str) -> Result<Command, CommandParseError> {
        Command::parse(&self.parser, body).map_err(|error| {
            // Return silently if the command is not for the bot
            // Otherwise, send an error message
            match format_command_error(error) {
                Some(message) => CommandParseError::InvalidCommand(message),
                None => CommandParseError::NotForBot,
            }
        })
    }

    /// Executes a parsed command and returns the result.
    ///
    /// # Command Handlers
    ///
    /// - [`Command::Help`] → [`handle_help`]
    /// - [`Command::List`] → [`handle_list`]
    pub async fn parse_command(&self, command: &Command, context: &CommandContext) -> CommandResult {
        match command {
            Command::Help => handle_help(),
            Command::List(target, visibility) => {
                handle_list(context, &self.resolver, *target, *visibility).await
            }
        }
    }
}
