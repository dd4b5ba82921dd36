//! List command handler.
//!
//! Resolves the players online on a Minecraft server. The server is the one
//! named in the command, or else the one bound to the channel the command was
//! sent from. Replies are private to the sender unless `public` was given.

use log::{debug, error};

use crate::{
    commands::{
        CommandContext, CommandResult, Visibility,
        markdown_response::{format_missing_server, format_roster, format_unexpected_error},
    },
    status::{Requester, StatusResolver, Target},
};

/// Lists the players online on the requested server.
///
/// # Arguments
///
/// * `context` - Channel the command was sent from
/// * `resolver` - Resolver used to reach the server
/// * `target` - Server named in the command, if any
/// * `visibility` - Who can see the reply
pub async fn handle_list<R: Requester>(
    context: &CommandContext,
    resolver: &StatusResolver<R>,
    target: Option<Target>,
    visibility: Visibility,
) -> CommandResult {
    debug!("handling list command {:?} in {:?}", target, context);

    let Some(target) = target.or(context.channel_target) else {
        return CommandResult {
            response: format_missing_server(),
            ephemeral: true,
        };
    };

    let response = match resolver.resolve(target).await {
        Ok(roster) => {
            if !roster.is_exact() {
                debug!("players of {} come from the status sample", target);
            }
            format_roster(&roster)
        }
        Err(e) => {
            error!("Unable to list players of {}: {}", target, e);
            format_unexpected_error()
        }
    };

    let result = CommandResult {
        response,
        ephemeral: visibility == Visibility::Private,
    };

    debug!("list command result {:?}", result);

    result
}
