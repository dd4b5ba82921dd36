//! Network client for Minecraft servers.
//!
//! This module provides the [`McRequester`] struct, which runs the status and
//! query exchanges against a server, each bounded by its own timeout.

use std::time::Duration;

use log::debug;
use mockall::automock;
use tokio::time;

use crate::status::{
    ProtocolError, ping, query,
    structs::{Endpoint, QueryRoster, StatusSnapshot},
};

/// Client requesting player information from Minecraft servers.
///
/// # Examples
///
/// ```no_run
/// let requester = McRequester::new(Duration::from_secs(3), Duration::from_secs(3));
/// let status = requester.status(&Endpoint::new("mc.example.com", 25565)).await.unwrap();
/// println!("{} players online", status.online);
/// ```
pub struct McRequester {
    /// Upper bound for one status exchange
    status_timeout: Duration,
    /// Upper bound for one query exchange
    query_timeout: Duration,
}

/// Trait for requesting player information from a server.
///
/// This trait abstracts the network exchanges for easier testing with mocks.
#[automock]
pub trait Requester {
    /// Runs one status exchange.
    async fn status(&self, endpoint: &Endpoint) -> Result<StatusSnapshot, ProtocolError>;
    /// Runs one query exchange.
    async fn query(&self, endpoint: &Endpoint) -> Result<QueryRoster, ProtocolError>;
}

impl McRequester {
    /// Create a new [McRequester].
    ///
    /// # Arguments
    ///
    /// * `status_timeout` - Time allowed for a status exchange before giving up.
    /// * `query_timeout` - Time allowed for a query exchange before giving up.
    pub fn new(status_timeout: Duration, query_timeout: Duration) -> Self {
        McRequester {
            status_timeout,
            query_timeout,
        }
    }
}

impl Requester for McRequester {
    /// Connects over TCP and performs a Server List Ping.
    ///
    /// Returns [`ProtocolError::Timeout`] when the server does not answer
    /// within the status timeout.
    async fn status(&self, endpoint: &Endpoint) -> Result<StatusSnapshot, ProtocolError> {
        let snapshot = time::timeout(self.status_timeout, ping::fetch_status(endpoint))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        debug!("status of {} -> {}", endpoint, snapshot);

        Ok(snapshot)
    }

    /// Sends a full stat query over UDP.
    ///
    /// Servers with query disabled never answer UDP, so this usually ends in
    /// [`ProtocolError::Timeout`] for them.
    async fn query(&self, endpoint: &Endpoint) -> Result<QueryRoster, ProtocolError> {
        let roster = time::timeout(self.query_timeout, query::fetch_roster(endpoint))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        debug!("query of {} -> {:?}", endpoint, roster.players);

        Ok(roster)
    }
}
