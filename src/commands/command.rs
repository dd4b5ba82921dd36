//! Command parsing and handling.
//!
//! This module provides command parsing functionality for the bot, converting
//! chat message text into structured [`Command`] enums that can be processed
//! by the application.

use command_parser::{Command as ParserCommand, Parser};
use log::debug;

use crate::{
    commands::markdown_response::{format_unknown_command, format_unknown_server},
    status::Target,
};

/// Name of the bot in commands, e.g. `!grumbot list`.
const BOT_NAME: &str = "grumbot";
/// Argument making a reply visible to the whole channel.
const PUBLIC_ARGUMENT: &str = "public";

/// Who can see the reply to a command.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Visibility {
    /// Only the user who sent the command
    Private,
    /// Everyone in the channel
    Public,
}

/// Represents a parsed bot command.
#[derive(Debug, Hash, PartialEq, Eq)]
pub enum Command {
    /// Display help information
    Help,
    /// List the players online on a server
    ///
    /// # Fields
    ///
    /// * `Option<Target>` - Server to list, `None` to use the channel's server
    /// * `Visibility` - Who can see the reply
    List(Option<Target>, Visibility),
}

/// Errors that can occur during command parsing.
#[derive(Debug)]
pub enum CommandParsingError {
    /// The message could not be parsed as a command
    UnableToParse,
    /// The command is not for this bot (wrong prefix)
    NotGrumbot,
    /// The command is not recognized
    Unknown,
    /// The list command names a server that does not exist
    UnknownServer(String),
}

impl Command {
    /// Parses a message string into a Command.
    ///
    /// # Arguments
    ///
    /// * `parser` - The command parser instance configured for the bot
    /// * `body` - The message text to parse
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The message is not a command format - [`CommandParsingError::UnableToParse`]
    /// - The command is for a different bot - [`CommandParsingError::NotGrumbot`]
    /// - The command is not recognized - [`CommandParsingError::Unknown`]
    /// - The list command names an unknown server - [`CommandParsingError::UnknownServer`]
    ///
    /// # Examples
    ///
    /// ```
    /// # use command_parser::Parser;
    /// # use grumbot::commands::command::Command;
    /// let parser = Parser::new('!', '-');
    /// let result = Command::parse(&parser, "!grumbot list survival");
    /// assert!(result.is_ok());
    /// ```
    pub fn parse(parser: &Parser, body: &str) -> Result<Self, CommandParsingError> {
        // For an unknown reason the parser ignores the last word, so we add a dummy word at the end
        let body = body.to_string() + " dummy";

        // This is normal to fails if the message is not a command
        let command = match parser.parse(&body) {
            Ok(cmd) => cmd,
            Err(_) => return Err(CommandParsingError::UnableToParse),
        };

        // Ignore commands that are not for the bot
        if command.name != BOT_NAME {
            return Err(CommandParsingError::NotGrumbot);
        }

        debug!("Parsing command: {:?}", command);

        // If no arguments, return help
        if command.arguments.is_empty() {
            return Ok(Command::Help);
        }

        match command.arguments[0].as_str() {
            "help" => Ok(Command::Help),
            "list" => {
                let (target, visibility) = Self::parse_list(&command)?;
                Ok(Command::List(target, visibility))
            }
            _ => Err(CommandParsingError::Unknown),
        }
    }

    /// Parses `list [server] [public]`, in any order after `list`.
    fn parse_list(
        command: &ParserCommand,
    ) -> Result<(Option<Target>, Visibility), CommandParsingError> {
        debug!("Parsing list command: {:?}", command);

        let mut target = None;
        let mut visibility = Visibility::Private;

        for argument in command.arguments.iter().skip(1).filter(|a| !a.is_empty()) {
            if argument.eq_ignore_ascii_case(PUBLIC_ARGUMENT) {
                visibility = Visibility::Public;
                continue;
            }
            match argument.parse::<Target>() {
                Ok(parsed) if target.is_none() => target = Some(parsed),
                _ => return Err(CommandParsingError::UnknownServer(argument.clone())),
            }
        }

        debug!(
            "Parsed list command - target: {:?}, visibility: {:?}",
            target, visibility
        );

        Ok((target, visibility))
    }
}

/// Formats a command error into a user-friendly message.
///
/// `UnableToParse` and `NotGrumbot` return `None` to avoid responding to
/// non-command messages.
pub fn format_command_error(error: CommandParsingError) -> Option<String> {
    match error {
        CommandParsingError::Unknown => Some(format_unknown_command()),
        CommandParsingError::UnknownServer(server) => Some(format_unknown_server(&server)),
        _ => None,
    }
}
