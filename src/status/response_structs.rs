//! Response structures for the status protocol.
//!
//! The Status Response packet carries a JSON document describing the server.
//! Only the fields needed to list players are deserialized.

use serde::Deserialize;
use std::fmt;

use crate::status::structs::StatusSnapshot;

/// JSON document from the Status Response packet.
///
/// ```json
/// {
///   "version": { "name": "1.20.4", "protocol": 765 },
///   "players": {
///     "max": 20,
///     "online": 2,
///     "sample": [{ "name": "Alice", "id": "4566e69f-c907-48ee-8d71-d7ba5aa00d20" }]
///   },
///   "description": { "text": "A Minecraft Server" }
/// }
/// ```
#[derive(Deserialize, Debug)]
pub struct StatusResponse {
    /// Server software version.
    pub version: Option<VersionResponse>,
    /// Player counts and sample.
    pub players: PlayersResponse,
}

/// `version` object of a [`StatusResponse`].
#[derive(Deserialize, Debug)]
pub struct VersionResponse {
    pub name: String,
    pub protocol: i32,
}

/// `players` object of a [`StatusResponse`].
#[derive(Deserialize, Debug)]
pub struct PlayersResponse {
    /// Signed because some proxies report negative counts.
    pub max: i64,
    pub online: i64,
    /// Omitted entirely by some servers when nobody is online.
    #[serde(default)]
    pub sample: Vec<PlayerSample>,
}

/// Entry of the `players.sample` array.
#[derive(Deserialize, Debug)]
pub struct PlayerSample {
    pub name: String,
    /// Player UUID, all zeroes for anonymous players.
    #[serde(default)]
    pub id: String,
}

impl fmt::Display for PlayerSample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "name={}, id={}", self.name, self.id)
    }
}

impl From<StatusResponse> for StatusSnapshot {
    fn from(response: StatusResponse) -> Self {
        StatusSnapshot {
            online: clamp_count(response.players.online),
            max: clamp_count(response.players.max),
            sample: response
                .players
                .sample
                .into_iter()
                .map(|player| player.name)
                .collect(),
            version: response.version.map(|version| version.name),
        }
    }
}

/// Clamps a reported player count into `0..=u32::MAX`.
fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}
