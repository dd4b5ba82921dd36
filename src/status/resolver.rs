//! Resolution of a server's online players.
//!
//! This module provides the [`StatusResolver`] which turns a [`Target`] into a
//! [`RosterResult`] by combining the status and query protocols.

use log::{debug, error, info, warn};

use crate::status::{
    ProtocolError, ResolveError,
    requester::Requester,
    structs::{
        ANONYMOUS_PLAYER, INCOMPLETE_MARKER, RosterKind, RosterResult, ServerEntry, ServerTable,
        StatusSnapshot, Target,
    },
};

/// Number of status exchanges tried before giving up.
pub const MAX_STATUS_ATTEMPTS: u32 = 5;

/// Outcome of the exact roster step.
///
/// Everything except [`QueryOutcome::Exact`] leads to the status sample.
#[derive(Debug)]
enum QueryOutcome {
    /// The query protocol returned every player.
    Exact(Vec<String>),
    /// The server is configured as not supporting the query protocol.
    Unsupported,
    /// The server is supposed to answer queries but timed out.
    TimedOut,
    /// The server is supposed to answer queries but the exchange failed.
    Failed(ProtocolError),
}

/// Resolves the online players of configured servers.
///
/// Each call to [`StatusResolver::resolve`] is independent: the resolver keeps
/// no state besides its read-only [`ServerTable`], so it can be shared between
/// tasks without locking.
///
/// # Resolution
///
/// 1. Look up the endpoint of the target
/// 2. Request the status, up to [`MAX_STATUS_ATTEMPTS`] times
/// 3. Stop there if nobody is online
/// 4. Request the exact roster with the query protocol if the server supports it
/// 5. Otherwise build a best-effort roster from the status sample
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use grumbot::status::{McRequester, StatusResolver, Target};
///
/// # async fn example(table: grumbot::status::ServerTable) {
/// let requester = McRequester::new(Duration::from_secs(3), Duration::from_secs(3));
/// let resolver = StatusResolver::new(requester, table);
/// match resolver.resolve(Target::Survival).await {
///     Ok(roster) => println!("{}/{} online", roster.online, roster.max),
///     Err(e) => println!("unable to reach survival: {}", e),
/// }
/// # }
/// ```
pub struct StatusResolver<R: Requester> {
    /// Requester running the protocol exchanges
    requester: R,
    /// Endpoints and query support of every known target
    servers: ServerTable,
}

impl<R: Requester> StatusResolver<R> {
    /// Create a new [StatusResolver].
    ///
    /// # Arguments
    ///
    /// * `requester` - An implementation of the [Requester] trait to talk to the servers.
    /// * `servers` - The endpoint and query policy of every target.
    pub fn new(requester: R, servers: ServerTable) -> Self {
        StatusResolver { requester, servers }
    }

    /// Resolves the online players of `target`.
    ///
    /// # Returns
    ///
    /// * `Ok(RosterResult)` - An exact roster, a sampled roster, or an empty
    ///   roster when nobody is online
    /// * `Err(ResolveError::UnknownTarget)` - `target` has no endpoint
    /// * `Err(ResolveError::StatusUnavailable)` - every status attempt failed
    pub async fn resolve(&self, target: Target) -> Result<RosterResult, ResolveError> {
        let entry = self
            .servers
            .get(target)
            .ok_or(ResolveError::UnknownTarget(target))?;

        info!("resolve players of {} at {}", target, entry.endpoint);

        let snapshot = self.fetch_status(target, entry).await?;

        if snapshot.online == 0 {
            // Empty servers make the query protocol time out, skip it
            debug!("no players online on {}", target);
            return Ok(RosterResult {
                online: 0,
                max: snapshot.max,
                players: vec![],
                kind: RosterKind::Sample,
            });
        }

        let roster = match self.fetch_exact_roster(target, entry).await {
            QueryOutcome::Exact(players) => RosterResult {
                online: snapshot.online,
                max: snapshot.max,
                players,
                kind: RosterKind::Exact,
            },
            QueryOutcome::Unsupported => {
                warn!("query unsupported by {}, using status sample", target);
                sampled_roster(snapshot)
            }
            QueryOutcome::TimedOut => {
                error!("query timed out on {}, using status sample", target);
                sampled_roster(snapshot)
            }
            QueryOutcome::Failed(e) => {
                error!("query failed on {}: {}, using status sample", target, e);
                sampled_roster(snapshot)
            }
        };

        info!("resolved players of {} -> {}", target, roster);

        Ok(roster)
    }

    /// Requests the status until it succeeds or [`MAX_STATUS_ATTEMPTS`] is reached.
    ///
    /// Attempts follow each other without delay.
    async fn fetch_status(
        &self,
        target: Target,
        entry: &ServerEntry,
    ) -> Result<StatusSnapshot, ResolveError> {
        for attempt in 1..=MAX_STATUS_ATTEMPTS {
            match self.requester.status(&entry.endpoint).await {
                Ok(snapshot) => {
                    debug!("status of {} on attempt {} -> {}", target, attempt, snapshot);
                    return Ok(snapshot);
                }
                Err(e) if e.is_timeout() => {
                    warn!("status of {} timed out, attempt {}", target, attempt);
                }
                Err(e) => {
                    warn!("status of {} failed, attempt {}: {}", target, attempt, e);
                }
            }
        }

        error!(
            "status of {} unavailable after {} attempts",
            target, MAX_STATUS_ATTEMPTS
        );

        Err(ResolveError::StatusUnavailable {
            attempts: MAX_STATUS_ATTEMPTS,
        })
    }

    /// Requests the exact roster once, if the server supports the query protocol.
    async fn fetch_exact_roster(&self, target: Target, entry: &ServerEntry) -> QueryOutcome {
        if !entry.query {
            return QueryOutcome::Unsupported;
        }

        match self.requester.query(&entry.endpoint).await {
            Ok(roster) => {
                debug!(
                    "query of {} -> {} names, numplayers={:?}, maxplayers={:?}",
                    target,
                    roster.players.len(),
                    roster.online,
                    roster.max
                );
                QueryOutcome::Exact(roster.players)
            }
            Err(e) if e.is_timeout() => QueryOutcome::TimedOut,
            Err(e) => QueryOutcome::Failed(e),
        }
    }
}

/// Builds a best-effort roster from the status sample.
///
/// Anonymous entries are removed. If nothing is left while players are online,
/// the roster is a single [`ANONYMOUS_PLAYER`]. If fewer names than online
/// players remain, [`INCOMPLETE_MARKER`] is appended.
fn sampled_roster(snapshot: StatusSnapshot) -> RosterResult {
    let mut players: Vec<String> = snapshot
        .sample
        .into_iter()
        .filter(|name| name != ANONYMOUS_PLAYER)
        .collect();

    if players.is_empty() && snapshot.online >= 1 {
        players.push(ANONYMOUS_PLAYER.to_owned());
    } else if (players.len() as u64) < u64::from(snapshot.online) {
        players.push(INCOMPLETE_MARKER.to_owned());
    }

    RosterResult {
        online: snapshot.online,
        max: snapshot.max,
        players,
        kind: RosterKind::Sample,
    }
}
