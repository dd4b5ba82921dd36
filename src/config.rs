//! Configuration file structures for the Grumbot bot.
//!
//! This module defines the configuration file format using YAML. The
//! configuration lists the Minecraft servers the bot can report on, the chat
//! channels bound to each server and the network timeouts.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Minecraft servers, keyed by target name
//! servers:
//!   survival:
//!     host: "173.233.142.94"
//!     port: 25565
//!     # Whether the server answers the query protocol (enable-query=true)
//!     query: true
//!   modded:
//!     host: "173.233.142.10"
//!     query: false
//!
//! # Channels where `list` can be used without naming a server
//! channels:
//!   survival: [930585547842404372, 930322945040072734]
//!   modded: [1241016401502928967]
//!
//! # Timeouts in seconds for a single protocol exchange
//! timeouts:
//!   status: 3
//!   query: 3
//! ```
//!
//! Any value can be overridden with a `GRUMBOT_` environment variable, nested
//! keys being separated by `__`, e.g. `GRUMBOT_SERVERS__SURVIVAL__HOST`.

use std::{collections::HashMap, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

use crate::status::{DEFAULT_PORT, Endpoint, ServerEntry, ServerTable, Target};

/// Prefix of the environment variables overriding the configuration file.
const ENV_PREFIX: &str = "GRUMBOT_";
/// Default timeout in seconds of a protocol exchange.
const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Root configuration structure for the Grumbot bot.
#[derive(Deserialize, Debug)]
pub struct Config {
    /// Minecraft servers indexed by target
    pub servers: HashMap<Target, Server>,
    /// Channel ids bound to each target
    #[serde(default)]
    pub channels: HashMap<Target, Vec<u64>>,
    /// Protocol timeouts
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Minecraft server configuration.
///
/// # YAML Section
///
/// ```yaml
/// survival:
///   host: "mc.example.com"
///   port: 25565
///   query_port: 25565
///   query: true
/// ```
#[derive(Deserialize, Debug)]
pub struct Server {
    /// Host name or IP address of the server.
    pub host: String,

    /// TCP port of the server, 25565 when omitted.
    #[serde(default = "default_port")]
    pub port: u16,

    /// UDP port of the query protocol, same as `port` when omitted.
    ///
    /// Matches `query.port` in the server's `server.properties`.
    pub query_port: Option<u16>,

    /// Whether the server answers the query protocol.
    ///
    /// When `false`, the player list is built from the status sample, which
    /// may be incomplete on busy servers.
    #[serde(default)]
    pub query: bool,
}

/// Timeouts in seconds of a single protocol exchange.
#[derive(Deserialize, Debug)]
pub struct Timeouts {
    /// Status protocol timeout.
    #[serde(default = "default_timeout")]
    pub status: u64,
    /// Query protocol timeout.
    #[serde(default = "default_timeout")]
    pub query: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            status: DEFAULT_TIMEOUT_SECS,
            query: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    /// Loads the configuration from a YAML file merged with `GRUMBOT_`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or a required value is
    /// missing from both the file and the environment.
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Builds the read-only lookup table handed to the resolver.
    pub fn server_table(&self) -> ServerTable {
        self.servers
            .iter()
            .map(|(target, server)| {
                let mut endpoint = Endpoint::new(&server.host, server.port);
                if let Some(query_port) = server.query_port {
                    endpoint.query_port = query_port;
                }
                (
                    *target,
                    ServerEntry {
                        endpoint,
                        query: server.query,
                    },
                )
            })
            .collect()
    }

    /// Returns the target bound to `channel_id`, if any.
    pub fn target_for_channel(&self, channel_id: u64) -> Option<Target> {
        self.channels
            .iter()
            .find(|(_, ids)| ids.contains(&channel_id))
            .map(|(target, _)| *target)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.status)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.query)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    const CONFIG: &str = r#"
servers:
  survival:
    host: "173.233.142.94"
    port: 25565
    query: true
  modded:
    host: "173.233.142.10"
    query_port: 25575
  creative:
    host: "173.233.142.2"
    port: 25570
channels:
  survival: [930585547842404372, 930322945040072734]
  modded: [1241016401502928967]
timeouts:
  status: 5
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_load_config() {
        let file = write_config(CONFIG);
        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.servers.len(), 3);
        let survival = &config.servers[&Target::Survival];
        assert_eq!(survival.host, "173.233.142.94");
        assert_eq!(survival.port, 25565);
        assert!(survival.query);

        let modded = &config.servers[&Target::Modded];
        assert_eq!(modded.port, DEFAULT_PORT);
        assert_eq!(modded.query_port, Some(25575));
        assert!(!modded.query);

        assert_eq!(config.status_timeout(), Duration::from_secs(5));
        assert_eq!(config.query_timeout(), Duration::from_secs(3));
    }

    #[test]
    #[serial]
    fn test_load_config_missing_servers() {
        let file = write_config("channels: {}\n");
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    #[serial]
    fn test_load_config_unknown_target() {
        let file = write_config("servers:\n  lobby:\n    host: \"localhost\"\n");
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    #[serial]
    fn test_load_config_env_override() {
        let file = write_config(CONFIG);

        unsafe {
            std::env::set_var("GRUMBOT_SERVERS__SURVIVAL__HOST", "mc.example.com");
        }
        let config = Config::load(file.path().to_str().unwrap());
        unsafe {
            std::env::remove_var("GRUMBOT_SERVERS__SURVIVAL__HOST");
        }

        let config = config.unwrap();
        assert_eq!(config.servers[&Target::Survival].host, "mc.example.com");
        assert_eq!(config.servers[&Target::Survival].port, 25565);
    }

    #[test]
    #[serial]
    fn test_server_table() {
        let file = write_config(CONFIG);
        let table = Config::load(file.path().to_str().unwrap())
            .unwrap()
            .server_table();

        assert_eq!(table.len(), 3);

        let survival = table.get(Target::Survival).unwrap();
        assert_eq!(survival.endpoint, Endpoint::new("173.233.142.94", 25565));
        assert!(survival.query);

        let modded = table.get(Target::Modded).unwrap();
        assert_eq!(modded.endpoint.port, 25565);
        assert_eq!(modded.endpoint.query_port, 25575);

        let creative = table.get(Target::Creative).unwrap();
        assert_eq!(creative.endpoint.query_port, 25570);
        assert!(!creative.query);

        assert!(table.get(Target::Events).is_none());
    }

    #[test]
    #[serial]
    fn test_target_for_channel() {
        let file = write_config(CONFIG);
        let config = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(
            config.target_for_channel(930322945040072734),
            Some(Target::Survival)
        );
        assert_eq!(
            config.target_for_channel(1241016401502928967),
            Some(Target::Modded)
        );
        assert_eq!(config.target_for_channel(42), None);
    }
}
