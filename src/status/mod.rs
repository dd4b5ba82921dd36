//! Minecraft server status resolution.
//!
//! This module answers "who is playing on this server right now?" by speaking
//! the two protocols a Java edition server exposes, retrying the status
//! protocol and falling back to its player sample when the query protocol is
//! not available.
//!
//! # Modules
//!
//! - `ping` - Server List Ping over TCP, returning counts and a player sample
//! - `query` - GameSpy4 full stat over UDP, returning the exact player list
//! - `requester` - [`Requester`] seam combining both protocols
//! - `resolver` - [`StatusResolver`] retry, fallback and roster normalization
//! - `response_structs` - JSON documents returned by the status protocol
//! - `structs` - Targets, endpoints and roster results
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use grumbot::status::{McRequester, StatusResolver, Target};
//!
//! # async fn example(table: grumbot::status::ServerTable) {
//! let requester = McRequester::new(Duration::from_secs(3), Duration::from_secs(3));
//! let resolver = StatusResolver::new(requester, table);
//! let roster = resolver.resolve(Target::Survival).await;
//! # }
//! ```

mod ping;
mod query;
mod requester;
mod resolver;
mod response_structs;
mod structs;

pub use crate::status::requester::{McRequester, Requester};
pub use crate::status::resolver::StatusResolver;
pub use crate::status::structs::{
    DEFAULT_PORT, Endpoint, RosterResult, ServerEntry, ServerTable, Target,
};
#[cfg(test)]
pub use crate::status::{
    requester::MockRequester,
    structs::{ANONYMOUS_PLAYER, INCOMPLETE_MARKER, QueryRoster, RosterKind, StatusSnapshot},
};

use thiserror::Error;

/// Errors raised by a single protocol exchange with a server.
///
/// Timeouts are kept apart from every other failure because the resolver
/// logs them differently.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The server did not answer within the protocol timeout.
    #[error("timed out")]
    Timeout,
    /// Connection or socket failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The server answered with bytes that do not follow the protocol.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The status response did not contain a valid JSON document.
    #[error("invalid status json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ProtocolError::Timeout => true,
            ProtocolError::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

/// Errors that end a resolution without a roster.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The target has no configured endpoint.
    #[error("no endpoint configured for server {0}")]
    UnknownTarget(Target),
    /// Every status attempt failed.
    #[error("status unavailable after {attempts} attempts")]
    StatusUnavailable { attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_is_timeout() {
        assert!(ProtocolError::Timeout.is_timeout());
        assert!(
            ProtocolError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut)).is_timeout()
        );
        assert!(
            !ProtocolError::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused))
                .is_timeout()
        );
        assert!(!ProtocolError::Malformed("bad packet".to_owned()).is_timeout());
    }

    #[test]
    fn test_resolve_error_display() {
        assert_eq!(
            ResolveError::UnknownTarget(Target::Events).to_string(),
            "no endpoint configured for server events"
        );
        assert_eq!(
            ResolveError::StatusUnavailable { attempts: 5 }.to_string(),
            "status unavailable after 5 attempts"
        );
    }
}
