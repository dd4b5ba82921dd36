//! GameSpy4 query protocol, used by servers with `enable-query=true`.
//!
//! The exchange happens over UDP in two round trips:
//!
//! ```text
//! C→S  FE FD 09 <session>                          handshake
//! S→C  09 <session> <challenge as ASCII> 00
//! C→S  FE FD 00 <session> <challenge> 00 00 00 00  full stat
//! S→C  00 <session> <padding> <key 00 value 00>* 00 <padding> <name 00>* 00
//! ```
//!
//! Unlike the status protocol, the full stat lists every online player.

use std::{
    collections::HashMap,
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use log::debug;
use tokio::net::{self, UdpSocket};

use crate::status::{
    ProtocolError,
    structs::{Endpoint, QueryRoster},
};

const MAGIC: [u8; 2] = [0xFE, 0xFD];
const HANDSHAKE_TYPE: u8 = 0x09;
const STAT_TYPE: u8 = 0x00;
/// Only the lower 4 bits of each session id byte are read by the server.
const SESSION_ID_MASK: i32 = 0x0F0F_0F0F;
/// `splitnum\0\x80\0` preceding the key/value section.
const KV_PADDING_LEN: usize = 11;
/// `\x01player_\0\0` preceding the player section.
const PLAYERS_PADDING_LEN: usize = 10;
/// Largest UDP payload, full stat replies of busy servers exceed a few KiB.
const MAX_DATAGRAM_LEN: usize = 65535;

/// Runs a handshake then a full stat request against `endpoint.query_port`.
///
/// No timeout is applied here; the caller bounds the whole exchange.
pub async fn fetch_roster(endpoint: &Endpoint) -> Result<QueryRoster, ProtocolError> {
    debug!("query request to {}:{}", endpoint.host, endpoint.query_port);

    let address = resolve_address(endpoint).await?;
    let socket = UdpSocket::bind(unspecified_address(&address)).await?;
    socket.connect(address).await?;

    let session_id = rand::random::<i32>() & SESSION_ID_MASK;
    let mut buffer = vec![0u8; MAX_DATAGRAM_LEN];

    socket.send(&handshake_request(session_id)).await?;
    let received = socket.recv(&mut buffer).await?;
    let challenge = parse_handshake_response(&buffer[..received], session_id)?;

    socket
        .send(&full_stat_request(session_id, challenge))
        .await?;
    let received = socket.recv(&mut buffer).await?;
    let roster = parse_full_stat_response(&buffer[..received], session_id)?;

    debug!(
        "query response from {}:{} -> {:?}",
        endpoint.host, endpoint.query_port, roster
    );

    Ok(roster)
}

/// Resolves the query address of `endpoint`, keeping the first result.
async fn resolve_address(endpoint: &Endpoint) -> Result<SocketAddr, ProtocolError> {
    net::lookup_host((endpoint.host.as_str(), endpoint.query_port))
        .await?
        .next()
        .ok_or_else(|| {
            ProtocolError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} has no address", endpoint.host),
            ))
        })
}

/// Local wildcard address of the same family as `remote`.
fn unspecified_address(remote: &SocketAddr) -> SocketAddr {
    match remote {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    }
}

fn handshake_request(session_id: i32) -> Vec<u8> {
    let mut request = MAGIC.to_vec();
    request.push(HANDSHAKE_TYPE);
    request.extend(session_id.to_be_bytes());
    request
}

fn full_stat_request(session_id: i32, challenge: i32) -> Vec<u8> {
    let mut request = MAGIC.to_vec();
    request.push(STAT_TYPE);
    request.extend(session_id.to_be_bytes());
    request.extend(challenge.to_be_bytes());
    // Padding asks for the full stat instead of the basic one
    request.extend([0x00; 4]);
    request
}

/// Checks the response header and returns the bytes after it.
fn strip_header(response: &[u8], packet_type: u8, session_id: i32) -> Result<&[u8], ProtocolError> {
    if response.len() < 5 {
        return Err(ProtocolError::Malformed(format!(
            "query response of {} bytes",
            response.len()
        )));
    }
    if response[0] != packet_type {
        return Err(ProtocolError::Malformed(format!(
            "unexpected query packet type {:#04x}",
            response[0]
        )));
    }
    if response[1..5] != session_id.to_be_bytes() {
        return Err(ProtocolError::Malformed(
            "query session id mismatch".to_owned(),
        ));
    }

    Ok(&response[5..])
}

/// Extracts the challenge token from a handshake response.
fn parse_handshake_response(response: &[u8], session_id: i32) -> Result<i32, ProtocolError> {
    let payload = strip_header(response, HANDSHAKE_TYPE, session_id)?;
    let mut cursor = payload;
    let token = read_cstring(&mut cursor)?;

    token
        .trim()
        .parse::<i32>()
        .map_err(|_| ProtocolError::Malformed(format!("invalid challenge token '{}'", token)))
}

/// Extracts the key/value section and player names from a full stat response.
fn parse_full_stat_response(response: &[u8], session_id: i32) -> Result<QueryRoster, ProtocolError> {
    let payload = strip_header(response, STAT_TYPE, session_id)?;
    let mut cursor = skip(payload, KV_PADDING_LEN)?;

    let mut values: HashMap<String, String> = HashMap::new();
    loop {
        let key = read_cstring(&mut cursor)?;
        if key.is_empty() {
            break;
        }
        let value = read_cstring(&mut cursor)?;
        values.insert(key, value);
    }

    cursor = skip(cursor, PLAYERS_PADDING_LEN)?;

    let mut players = Vec::new();
    loop {
        let name = read_cstring(&mut cursor)?;
        if name.is_empty() {
            break;
        }
        players.push(name);
    }

    Ok(QueryRoster {
        players,
        online: values.get("numplayers").and_then(|v| v.parse().ok()),
        max: values.get("maxplayers").and_then(|v| v.parse().ok()),
    })
}

fn skip(bytes: &[u8], count: usize) -> Result<&[u8], ProtocolError> {
    bytes
        .get(count..)
        .ok_or_else(|| ProtocolError::Malformed("query response is truncated".to_owned()))
}

/// Reads a NUL-terminated string and advances `cursor` past the terminator.
///
/// Servers send names in Latin-1 or UTF-8 depending on the software, so
/// invalid sequences are replaced instead of rejected.
fn read_cstring(cursor: &mut &[u8]) -> Result<String, ProtocolError> {
    let end = cursor
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ProtocolError::Malformed("unterminated query string".to_owned()))?;

    let value = String::from_utf8_lossy(&cursor[..end]).into_owned();
    *cursor = &cursor[end + 1..];
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION_ID: i32 = 0x0102_0304;

    fn header(packet_type: u8) -> Vec<u8> {
        let mut bytes = vec![packet_type];
        bytes.extend(SESSION_ID.to_be_bytes());
        bytes
    }

    fn full_stat_response(players: &[&str]) -> Vec<u8> {
        let mut response = header(STAT_TYPE);
        response.extend_from_slice(b"splitnum\x00\x80\x00");
        for (key, value) in [
            ("hostname", "A Minecraft Server"),
            ("numplayers", "3"),
            ("maxplayers", "20"),
        ] {
            response.extend_from_slice(key.as_bytes());
            response.push(0);
            response.extend_from_slice(value.as_bytes());
            response.push(0);
        }
        response.push(0);
        response.extend_from_slice(b"\x01player_\x00\x00");
        for player in players {
            response.extend_from_slice(player.as_bytes());
            response.push(0);
        }
        response.push(0);
        response
    }

    #[test]
    fn test_handshake_request() {
        assert_eq!(
            handshake_request(SESSION_ID),
            vec![0xFE, 0xFD, 0x09, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn test_full_stat_request() {
        assert_eq!(
            full_stat_request(SESSION_ID, 9513307),
            vec![
                0xFE, 0xFD, 0x00, 0x01, 0x02, 0x03, 0x04, 0x00, 0x91, 0x29, 0x5B, 0x00, 0x00,
                0x00, 0x00
            ]
        );
    }

    #[test]
    fn test_parse_handshake_response() {
        let mut response = header(HANDSHAKE_TYPE);
        response.extend_from_slice(b"9513307\x00");

        assert_eq!(
            parse_handshake_response(&response, SESSION_ID).unwrap(),
            9513307
        );
    }

    #[test]
    fn test_parse_handshake_response_negative_token() {
        let mut response = header(HANDSHAKE_TYPE);
        response.extend_from_slice(b"-1234\x00");

        assert_eq!(
            parse_handshake_response(&response, SESSION_ID).unwrap(),
            -1234
        );
    }

    #[test]
    fn test_parse_handshake_response_session_mismatch() {
        let mut response = vec![HANDSHAKE_TYPE, 0x0F, 0x0F, 0x0F, 0x0F];
        response.extend_from_slice(b"1\x00");

        assert!(matches!(
            parse_handshake_response(&response, SESSION_ID),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_full_stat_response() {
        let response = full_stat_response(&["Alice", "Bob", "Carol"]);
        let roster = parse_full_stat_response(&response, SESSION_ID).unwrap();

        assert_eq!(roster.players, vec!["Alice", "Bob", "Carol"]);
        assert_eq!(roster.online, Some(3));
        assert_eq!(roster.max, Some(20));
    }

    #[test]
    fn test_parse_full_stat_response_no_players() {
        let response = full_stat_response(&[]);
        let roster = parse_full_stat_response(&response, SESSION_ID).unwrap();

        assert!(roster.players.is_empty());
    }

    #[test]
    fn test_parse_full_stat_response_truncated() {
        let mut response = full_stat_response(&["Alice"]);
        response.truncate(response.len() - 3);

        assert!(matches!(
            parse_full_stat_response(&response, SESSION_ID),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_full_stat_response_wrong_type() {
        let response = header(HANDSHAKE_TYPE);

        assert!(matches!(
            parse_full_stat_response(&response, SESSION_ID),
            Err(ProtocolError::Malformed(_))
        ));
    }

    /// Answers one handshake and one full stat request with `players`.
    async fn serve_full_stat(server: UdpSocket, players: Vec<String>) {
        let mut buffer = [0u8; 64];

        let (_, peer) = server.recv_from(&mut buffer).await.unwrap();
        let session: [u8; 4] = buffer[3..7].try_into().unwrap();
        let mut handshake = vec![HANDSHAKE_TYPE];
        handshake.extend_from_slice(&session);
        handshake.extend_from_slice(b"42\x00");
        server.send_to(&handshake, peer).await.unwrap();

        let (_, peer) = server.recv_from(&mut buffer).await.unwrap();
        assert_eq!(buffer[7..11], 42i32.to_be_bytes());
        let names: Vec<&str> = players.iter().map(String::as_str).collect();
        let mut stat = full_stat_response(&names);
        stat[1..5].copy_from_slice(&session);
        server.send_to(&stat, peer).await.unwrap();
    }

    #[test]
    fn test_unspecified_address_matches_family() {
        let v4: SocketAddr = "127.0.0.1:25565".parse().unwrap();
        let v6: SocketAddr = "[::1]:25565".parse().unwrap();

        assert_eq!(unspecified_address(&v4), "0.0.0.0:0".parse::<SocketAddr>().unwrap());
        assert_eq!(unspecified_address(&v6), "[::]:0".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_fetch_roster_large_response() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let players: Vec<String> = (0..300).map(|i| format!("Player_{:09}", i)).collect();
        let expected = players.clone();
        tokio::spawn(serve_full_stat(server, players));

        let mut endpoint = Endpoint::new("127.0.0.1", 25565);
        endpoint.query_port = port;

        let roster = fetch_roster(&endpoint).await.unwrap();
        assert_eq!(roster.players.len(), 300);
        assert_eq!(roster.players, expected);
    }

    #[tokio::test]
    async fn test_fetch_roster_ipv6() {
        let server = UdpSocket::bind("[::1]:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        tokio::spawn(serve_full_stat(server, vec!["Alice".to_owned()]));

        let mut endpoint = Endpoint::new("::1", 25565);
        endpoint.query_port = port;

        let roster = fetch_roster(&endpoint).await.unwrap();
        assert_eq!(roster.players, vec!["Alice"]);
    }

    #[tokio::test]
    async fn test_fetch_roster() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        tokio::spawn(serve_full_stat(
            server,
            vec!["Alice".to_owned(), "Bob".to_owned()],
        ));

        let mut endpoint = Endpoint::new("127.0.0.1", 25565);
        endpoint.query_port = port;

        let roster = fetch_roster(&endpoint).await.unwrap();
        assert_eq!(roster.players, vec!["Alice", "Bob"]);
    }
}
