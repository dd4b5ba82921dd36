//! Command action handlers.
//!
//! Individual handler functions for each bot command. Each handler processes
//! the command and returns a [`CommandResult`](crate::commands::CommandResult)
//! carrying the Markdown response and whether it is visible to the sender only.
//!
//! # Available Handlers
//!
//! - [`handle_help`] - Display help information
//! - [`handle_list`] - List the players online on a Minecraft server

mod help;
mod list;

pub use crate::commands::actions::{help::handle_help, list::handle_list};
