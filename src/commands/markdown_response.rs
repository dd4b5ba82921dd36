//! Markdown response formatters for bot commands.
//!
//! This module provides functions to format bot responses in Markdown format
//! for display in chat channels.

use crate::status::RosterResult;

/// Formats the help message showing available bot commands.
///
/// # Examples
///
/// ```
/// # use grumbot::commands::markdown_response::format_help;
/// let help = format_help();
/// assert!(help.contains("Commands:"));
/// ```
pub fn format_help() -> String {
    let body = "Commands:\n\
        - `list [server] [public]`: list the players online on a Minecraft server\n\
        - `help`: show this help message\n\n\
        Servers: `survival`, `modded`, `creative`, `events`, `testing`. \
        The server can be omitted in channels bound to a server.\n\
        Replies are only visible to you unless `public` is given.";

    body.to_owned()
}

/// Formats a response for an unknown command.
///
/// # Examples
///
/// ```
/// # use grumbot::commands::markdown_response::format_unknown_command;
/// let msg = format_unknown_command();
/// assert!(msg.contains("Unknown command"));
/// ```
pub fn format_unknown_command() -> String {
    "Unknown command. Type `!grumbot help` for more information.".to_owned()
}

/// Formats an error response for an unknown server name.
///
/// # Arguments
///
/// * `server` - The server name given by the user
pub fn format_unknown_server(server: &str) -> String {
    format!(
        "Unknown server '{}'. Usage: `!grumbot list [server] [public]`",
        server
    )
}

/// Formats the response sent when no server was given outside a bound channel.
pub fn format_missing_server() -> String {
    "**You must either select a server or be in a recognised channel**".to_owned()
}

/// Formats the response sent when the server could not be reached.
pub fn format_unexpected_error() -> String {
    "**An unexpected error occurred**".to_owned()
}

/// Formats the players online on a server.
///
/// Players are listed in the order given by the server, inside a code block
/// so that names with Markdown characters are displayed verbatim.
///
/// # Examples
///
/// ```
/// # use grumbot::commands::markdown_response::format_roster;
/// # use grumbot::status::{RosterKind, RosterResult};
/// let roster = RosterResult {
///     online: 2,
///     max: 20,
///     players: vec!["Alice".to_string(), "Bob".to_string()],
///     kind: RosterKind::Exact,
/// };
/// assert_eq!(
///     format_roster(&roster),
///     "**Online players (2/20):**\n```Alice, Bob```"
/// );
/// ```
pub fn format_roster(roster: &RosterResult) -> String {
    if roster.online == 0 {
        return "**No online players**".to_owned();
    }

    format!(
        "**Online players ({}/{}):**\n```{}```",
        roster.online,
        roster.max,
        roster.players.join(", ")
    )
}
