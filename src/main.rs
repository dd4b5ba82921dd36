//! Grumbot - A chat bot listing the players online on Minecraft servers.
//!
//! This is the main entry point for the Grumbot bot, which answers chat
//! commands by asking Minecraft Java edition servers who is playing.
//!
//! # Overview
//!
//! A player count alone is easy to get from a server, but the names are not:
//! the status protocol only returns a sample of them, capped at a dozen or so.
//! Grumbot combines the status protocol with the query protocol, when the
//! server enables it, to list every player, and falls back to the sample
//! otherwise.
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! servers:
//!   survival:
//!     host: "173.233.142.94"
//!     query: true
//!   modded:
//!     host: "173.233.142.10"
//!
//! channels:
//!   survival: [930585547842404372]
//!
//! timeouts:
//!   status: 3
//!   query: 3
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `GRUMBOT_` prefix:
//!
//! ```bash
//! export GRUMBOT_SERVERS__SURVIVAL__HOST="mc.example.com"
//! export GRUMBOT_TIMEOUTS__QUERY=5
//! ```
//!
//! # Usage
//!
//! ```bash
//! grumbot --config config.yaml --channel 930585547842404372
//! grumbot --config config.yaml --message "!grumbot list survival"
//! ```
//!
//! # Bot Commands
//!
//! - `!grumbot help` - Display help information
//! - `!grumbot list [server] [public]` - List the players online on a server
//!
//! # Architecture
//!
//! - [`bot`] - Reads messages and prints replies
//! - [`commands`] - Command parsing and execution
//! - [`config`] - YAML configuration with environment variable support
//! - [`status`] - Status and query protocols, retry and fallback policy
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//!   - Set to `debug` for verbose output
//!   - Set to `warn` or `error` for minimal logging

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{bot::Bot, config::Config};

mod bot;
mod commands;
mod config;
mod status;

/// Command-line arguments for the Grumbot bot.
///
/// # Examples
///
/// ```bash
/// grumbot --config config.yaml --channel 930585547842404372
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// See the [`config`] module for the expected format.
    #[arg(short, long)]
    config: String,

    /// Id of the channel the messages are sent from.
    ///
    /// When the channel is bound to a server in the configuration, `list` can
    /// be used without naming a server.
    #[arg(long)]
    channel: Option<u64>,

    /// Single message to answer instead of reading messages from stdin.
    #[arg(short, long)]
    message: Option<String>,
}

/// Main entry point for the Grumbot bot.
///
/// 1. **Logging Setup**: Configures the logger with `info` level by default
/// 2. **Argument Parsing**: Parses command-line arguments using `clap`
/// 3. **Configuration Loading**: Reads the YAML configuration merged with `GRUMBOT_` variables
/// 4. **Bot Execution**: Answers the single message, or every line read from stdin
///
/// Configuration errors are logged and the bot exits without panicking.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting grumbot {}...", env!("CARGO_PKG_VERSION"));

    // Parse command line arguments
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    let bot = Bot::new(config, args);
    if let Err(e) = bot.start().await {
        error!("Bot stopped: {}", e);
    }
}
