//! Help command handler.
//!
//! Displays the available commands, the known servers and how reply
//! visibility works. The reply is always private to the sender.

use log::debug;

use crate::commands::{CommandResult, markdown_response::format_help};

/// Returns formatted help information about available commands.
pub fn handle_help() -> CommandResult {
    debug!("handling help command");

    CommandResult {
        response: format_help(),
        ephemeral: true,
    }
}
