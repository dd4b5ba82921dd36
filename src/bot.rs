//! Bot module connecting chat messages to the status resolver.
//!
//! This module provides the main [`Bot`] implementation. The bot reads chat
//! messages from the console, parses the `!grumbot` commands they contain and
//! prints the replies.
//!
//! # Command Processing Flow
//!
//! ```text
//! Chat Message → Parse Command → Resolve Channel → Execute → Print Reply
//! ```
//!
//! Every message is handled on its own task, so a slow server does not delay
//! the replies to other messages.
//!
//! # Reply Visibility
//!
//! Replies meant for the sender only are prefixed with `[private]`, the others
//! are printed as is.

use std::sync::Arc;

use log::{debug, info};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    task::JoinSet,
};

use crate::{
    Args,
    commands::{CommandContext, CommandParseError, CommandResult, Commander},
    config::Config,
    status::{McRequester, Requester, StatusResolver},
};

/// Prefix of the replies only visible to the sender.
const PRIVATE_PREFIX: &str = "[private]";

/// Main bot structure answering `!grumbot` commands.
///
/// # Thread Safety
///
/// The commander and the configuration are wrapped in `Arc` to be shared with
/// the task handling each message. Both are read-only once the bot is built.
pub struct Bot {
    /// Command parser and executor.
    commander: Arc<Commander<McRequester>>,

    /// Configuration, used to find the server bound to a channel.
    config: Arc<Config>,

    /// Channel the messages are sent from.
    channel_id: Option<u64>,

    /// Single message to answer instead of reading the console.
    message: Option<String>,
}

impl Bot {
    /// Creates a new Bot instance from configuration and command line arguments.
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration loaded from file, providing the servers,
    ///   the channels bound to them and the protocol timeouts
    /// * `args` - Command line arguments providing the channel and the
    ///   optional single message
    pub fn new(config: Config, args: Args) -> Self {
        let requester = McRequester::new(config.status_timeout(), config.query_timeout());
        let servers = config.server_table();
        info!("{} servers configured", servers.len());

        let resolver = StatusResolver::new(requester, servers);
        let commander = Arc::new(Commander::new(resolver));

        Bot {
            commander,
            config: Arc::new(config),
            channel_id: args.channel,
            message: args.message,
        }
    }

    /// Starts answering messages.
    ///
    /// With a single message, answers it and returns. Otherwise reads one
    /// message per line from stdin until end of input, then waits for the
    /// pending replies.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin cannot be read.
    pub async fn start(self) -> Result<(), anyhow::Error> {
        if let Some(message) = &self.message {
            let context = self.command_context();
            if let Some(reply) = handle_message(&self.commander, context, message).await {
                println!("{}", reply);
            }
            return Ok(());
        }

        info!("reading messages from stdin");

        let mut lines = BufReader::new(io::stdin()).lines();
        let mut tasks = JoinSet::new();

        while let Some(line) = lines.next_line().await? {
            let commander = Arc::clone(&self.commander);
            let context = self.command_context();
            tasks.spawn(async move {
                if let Some(reply) = handle_message(&commander, context, &line).await {
                    println!("{}", reply);
                }
            });
        }

        debug!("end of input, waiting for {} pending messages", tasks.len());
        while tasks.join_next().await.is_some() {}

        Ok(())
    }

    /// Builds the context of a message sent from the bot's channel.
    fn command_context(&self) -> CommandContext {
        CommandContext {
            channel_target: self
                .channel_id
                .and_then(|id| self.config.target_for_channel(id)),
        }
    }
}

/// Handles a chat message and returns the reply to print, if any.
///
/// Messages that are not commands for this bot get no reply. Invalid commands
/// get a private error message.
async fn handle_message<R: Requester>(
    commander: &Commander<R>,
    context: CommandContext,
    body: &str,
) -> Option<String> {
    // Parse body to extract command
    let command = match commander.parse(body) {
        Ok(command) => command,
        Err(e) => match e {
            // Return silently if the command is not for the bot
            CommandParseError::NotForBot => return None,
            // Reply with the error if the command is invalid
            CommandParseError::InvalidCommand(message) => {
                return Some(format_reply(&CommandResult {
                    response: message,
                    ephemeral: true,
                }));
            }
        },
    };

    debug!("handling {:?} with {:?}", command, context);

    let result = commander.parse_command(&command, &context).await;

    Some(format_reply(&result))
}

/// Formats a command result for the console, marking private replies.
fn format_reply(result: &CommandResult) -> String {
    if result.ephemeral {
        format!("{} {}", PRIVATE_PREFIX, result.response)
    } else {
        result.response.clone()
    }
}
