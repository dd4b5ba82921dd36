//! Data structures describing Minecraft servers and their player state.
//!
//! This module defines the logical server identities, their network endpoints,
//! and the transient results produced while resolving a server's roster.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::Deserialize;

/// Display name the status protocol uses for players hiding their identity.
pub const ANONYMOUS_PLAYER: &str = "Anonymous Player";

/// Trailing entry appended to a sampled roster known to be incomplete.
pub const INCOMPLETE_MARKER: &str = "...";

/// Default port of a Java edition Minecraft server.
pub const DEFAULT_PORT: u16 = 25565;

/// Logical identity of a Minecraft server.
///
/// There is no "default" variant: a caller that does not know which server
/// to ask for holds `Option<Target>` and must pick a concrete value before
/// calling the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Survival,
    Modded,
    Creative,
    Events,
    Testing,
}

impl Target {
    /// Lowercase name used in commands and configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Target::Survival => "survival",
            Target::Modded => "modded",
            Target::Creative => "creative",
            Target::Events => "events",
            Target::Testing => "testing",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "survival" => Ok(Target::Survival),
            "modded" => Ok(Target::Modded),
            "creative" => Ok(Target::Creative),
            "events" => Ok(Target::Events),
            "testing" => Ok(Target::Testing),
            _ => Err(format!("unknown server '{}'", s)),
        }
    }
}

/// Network location of a Minecraft server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or IP address
    pub host: String,
    /// TCP port answering the status protocol
    pub port: u16,
    /// UDP port answering the query protocol
    ///
    /// Usually the same as `port`, but `enable-query` servers may listen elsewhere.
    pub query_port: u16,
}

impl Endpoint {
    /// Create an [`Endpoint`] whose query port matches its status port.
    pub fn new(host: &str, port: u16) -> Self {
        Endpoint {
            host: host.to_owned(),
            port,
            query_port: port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A server endpoint along with its query support policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub endpoint: Endpoint,
    /// Whether the server answers the query protocol with an exact roster
    ///
    /// Servers known not to support it go straight to the status sample.
    pub query: bool,
}

/// Read-only lookup table from [`Target`] to [`ServerEntry`].
///
/// Built once from configuration and owned by the resolver for the whole
/// process lifetime.
#[derive(Debug, Clone, Default)]
pub struct ServerTable {
    entries: HashMap<Target, ServerEntry>,
}

impl ServerTable {
    pub fn get(&self, target: Target) -> Option<&ServerEntry> {
        self.entries.get(&target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(Target, ServerEntry)> for ServerTable {
    fn from_iter<I: IntoIterator<Item = (Target, ServerEntry)>>(iter: I) -> Self {
        ServerTable {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Result of one successful status protocol exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Number of players currently online
    pub online: u32,
    /// Maximum number of players
    pub max: u32,
    /// Player names sampled by the server
    ///
    /// May omit players and may contain [`ANONYMOUS_PLAYER`] entries.
    pub sample: Vec<String>,
    /// Server version name, e.g. `1.20.4`
    pub version: Option<String>,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "online={}, max={}, sample={:?}, version={:?}",
            self.online, self.max, self.sample, self.version
        )
    }
}

/// Result of one successful full stat query exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRoster {
    /// Every online player, in server order
    pub players: Vec<String>,
    /// `numplayers` reported by the server, if any
    pub online: Option<u32>,
    /// `maxplayers` reported by the server, if any
    pub max: Option<u32>,
}

/// Origin of the player names in a [`RosterResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterKind {
    /// Complete list returned by the query protocol
    Exact,
    /// Best-effort list derived from the status sample
    Sample,
}

/// Player state of a server, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterResult {
    pub online: u32,
    pub max: u32,
    pub players: Vec<String>,
    pub kind: RosterKind,
}

impl RosterResult {
    pub fn is_exact(&self) -> bool {
        self.kind == RosterKind::Exact
    }
}

impl fmt::Display for RosterResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "online={}, max={}, players={:?}, kind={:?}",
            self.online, self.max, self.players, self.kind
        )
    }
}
