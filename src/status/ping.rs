//! Server List Ping, the status protocol of Java edition servers.
//!
//! A status exchange is three packets over a fresh TCP connection:
//!
//! ```text
//! C→S  Handshake       0x00 | VarInt protocol | String host | u16 port | VarInt 1
//! C→S  Status Request  0x00
//! S→C  Status Response 0x00 | String json
//! ```
//!
//! Every packet is prefixed with its length as a VarInt.

use log::debug;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use crate::status::{
    ProtocolError,
    response_structs::StatusResponse,
    structs::{Endpoint, StatusSnapshot},
};

/// Protocol version sent in the handshake.
///
/// Servers answer status requests for any version; `-1` is the value
/// conventionally used by pingers that do not target a specific release.
const HANDSHAKE_PROTOCOL_VERSION: i32 = -1;
/// Next state requested by the handshake: 1 is status.
const NEXT_STATE_STATUS: i32 = 1;
const HANDSHAKE_PACKET_ID: i32 = 0x00;
const STATUS_REQUEST_PACKET_ID: i32 = 0x00;
const STATUS_RESPONSE_PACKET_ID: i32 = 0x00;
/// A VarInt never spans more than 5 bytes.
const VARINT_MAX_BYTES: usize = 5;
/// Upper bound on an accepted packet, large enough for a favicon.
const MAX_PACKET_LENGTH: usize = 2 * 1024 * 1024;

/// Runs a full status exchange against `endpoint`.
///
/// No timeout is applied here; the caller bounds the whole exchange.
pub async fn fetch_status(endpoint: &Endpoint) -> Result<StatusSnapshot, ProtocolError> {
    debug!("status request to {}", endpoint);

    let mut stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;

    stream
        .write_all(&handshake_packet(&endpoint.host, endpoint.port))
        .await?;
    stream
        .write_all(&frame(&varint_bytes(STATUS_REQUEST_PACKET_ID)))
        .await?;
    stream.flush().await?;

    let json = read_status_response(&mut stream).await?;
    debug!("status response from {} -> {}", endpoint, json);

    let response: StatusResponse = serde_json::from_str(&json)?;
    if let Some(version) = &response.version {
        debug!(
            "{} runs {} (protocol {})",
            endpoint, version.name, version.protocol
        );
    }

    Ok(StatusSnapshot::from(response))
}

/// Builds the framed handshake packet switching the connection to status.
fn handshake_packet(host: &str, port: u16) -> Vec<u8> {
    let mut data = varint_bytes(HANDSHAKE_PACKET_ID);
    data.extend(varint_bytes(HANDSHAKE_PROTOCOL_VERSION));
    data.extend(string_bytes(host));
    data.extend(port.to_be_bytes());
    data.extend(varint_bytes(NEXT_STATE_STATUS));
    frame(&data)
}

/// Reads one Status Response packet and returns its JSON payload.
async fn read_status_response<S>(stream: &mut S) -> Result<String, ProtocolError>
where
    S: AsyncRead + Unpin,
{
    let length = read_varint(stream).await?;
    let length = usize::try_from(length)
        .map_err(|_| ProtocolError::Malformed(format!("negative packet length {}", length)))?;
    if length == 0 || length > MAX_PACKET_LENGTH {
        return Err(ProtocolError::Malformed(format!(
            "invalid packet length {}",
            length
        )));
    }

    let mut packet = vec![0u8; length];
    stream.read_exact(&mut packet).await?;
    let mut cursor = packet.as_slice();

    let packet_id = read_varint(&mut cursor).await?;
    if packet_id != STATUS_RESPONSE_PACKET_ID {
        return Err(ProtocolError::Malformed(format!(
            "unexpected packet id {:#04x}",
            packet_id
        )));
    }

    let json_length = read_varint(&mut cursor).await?;
    let json_length = usize::try_from(json_length).map_err(|_| {
        ProtocolError::Malformed(format!("negative string length {}", json_length))
    })?;
    if json_length > cursor.len() {
        return Err(ProtocolError::Malformed(format!(
            "string length {} exceeds packet",
            json_length
        )));
    }

    String::from_utf8(cursor[..json_length].to_vec())
        .map_err(|e| ProtocolError::Malformed(format!("status is not utf-8: {}", e)))
}

/// Prefixes `data` with its length.
fn frame(data: &[u8]) -> Vec<u8> {
    let mut packet = varint_bytes(data.len() as i32);
    packet.extend_from_slice(data);
    packet
}

/// Encodes a protocol string: VarInt byte length followed by UTF-8 bytes.
fn string_bytes(value: &str) -> Vec<u8> {
    let mut bytes = varint_bytes(value.len() as i32);
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

/// Encodes `value` as a VarInt.
///
/// Negative values are written as their unsigned 32-bit form and always take
/// five bytes.
fn varint_bytes(value: i32) -> Vec<u8> {
    let mut value = value as u32;
    let mut bytes = Vec::with_capacity(VARINT_MAX_BYTES);
    loop {
        if value & !0x7F == 0 {
            bytes.push(value as u8);
            return bytes;
        }
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

/// Decodes a VarInt from `reader`.
async fn read_varint<R>(reader: &mut R) -> Result<i32, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut value: u32 = 0;
    for position in 0..VARINT_MAX_BYTES {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7F) as u32) << (7 * position);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }

    Err(ProtocolError::Malformed("varint is too big".to_owned()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_varint_bytes() {
        assert_eq!(varint_bytes(0), vec![0x00]);
        assert_eq!(varint_bytes(1), vec![0x01]);
        assert_eq!(varint_bytes(127), vec![0x7F]);
        assert_eq!(varint_bytes(128), vec![0x80, 0x01]);
        assert_eq!(varint_bytes(300), vec![0xAC, 0x02]);
        assert_eq!(varint_bytes(25565), vec![0xDD, 0xC7, 0x01]);
        assert_eq!(varint_bytes(-1), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[tokio::test]
    async fn test_read_varint() {
        let mut bytes: &[u8] = &[0xDD, 0xC7, 0x01];
        assert_eq!(read_varint(&mut bytes).await.unwrap(), 25565);

        let mut bytes: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        assert_eq!(read_varint(&mut bytes).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_read_varint_too_big() {
        let mut bytes: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert!(matches!(
            read_varint(&mut bytes).await,
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_read_varint_truncated() {
        let mut bytes: &[u8] = &[0x80];
        assert!(matches!(
            read_varint(&mut bytes).await,
            Err(ProtocolError::Io(_))
        ));
    }

    #[test]
    fn test_handshake_packet() {
        let packet = handshake_packet("localhost", 25565);

        let mut expected = vec![
            0x00, // packet id
            0xFF, 0xFF, 0xFF, 0xFF, 0x0F, // protocol version -1
            0x09, // host length
        ];
        expected.extend_from_slice(b"localhost");
        expected.extend_from_slice(&[0x63, 0xDD]); // port
        expected.push(0x01); // next state

        assert_eq!(packet[0] as usize, expected.len());
        assert_eq!(&packet[1..], expected.as_slice());
    }

    #[tokio::test]
    async fn test_read_status_response() {
        let json = r#"{"players":{"max":20,"online":0}}"#;
        let mut data = varint_bytes(STATUS_RESPONSE_PACKET_ID);
        data.extend(string_bytes(json));
        let packet = frame(&data);

        let mut stream = packet.as_slice();
        assert_eq!(read_status_response(&mut stream).await.unwrap(), json);
    }

    #[tokio::test]
    async fn test_read_status_response_wrong_packet_id() {
        let mut data = varint_bytes(0x01);
        data.extend(string_bytes("{}"));
        let packet = frame(&data);

        let mut stream = packet.as_slice();
        assert!(matches!(
            read_status_response(&mut stream).await,
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_read_status_response_string_overflows_packet() {
        let mut data = varint_bytes(STATUS_RESPONSE_PACKET_ID);
        data.extend(varint_bytes(100));
        data.extend_from_slice(b"{}");
        let packet = frame(&data);

        let mut stream = packet.as_slice();
        assert!(matches!(
            read_status_response(&mut stream).await,
            Err(ProtocolError::Malformed(_))
        ));
    }

    /// Serves one status exchange on a local port and returns the endpoint.
    async fn serve_status(json: &'static str) -> Endpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Handshake then status request
            for _ in 0..2 {
                let length = read_varint(&mut socket).await.unwrap();
                let mut packet = vec![0u8; length as usize];
                socket.read_exact(&mut packet).await.unwrap();
            }

            let mut data = varint_bytes(STATUS_RESPONSE_PACKET_ID);
            data.extend(string_bytes(json));
            socket.write_all(&frame(&data)).await.unwrap();
        });

        Endpoint::new("127.0.0.1", port)
    }

    #[tokio::test]
    async fn test_fetch_status() {
        let endpoint = serve_status(
            r#"{"version":{"name":"1.20.4","protocol":765},"players":{"max":20,"online":2,"sample":[{"name":"Alice","id":"a"},{"name":"Bob","id":"b"}]},"description":"hi"}"#,
        )
        .await;

        let snapshot = fetch_status(&endpoint).await.unwrap();
        assert_eq!(snapshot.online, 2);
        assert_eq!(snapshot.max, 20);
        assert_eq!(snapshot.sample, vec!["Alice", "Bob"]);
        assert_eq!(snapshot.version.as_deref(), Some("1.20.4"));
    }

    #[tokio::test]
    async fn test_fetch_status_invalid_json() {
        let endpoint = serve_status("not json").await;

        assert!(matches!(
            fetch_status(&endpoint).await,
            Err(ProtocolError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_status_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            fetch_status(&Endpoint::new("127.0.0.1", port)),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(ProtocolError::Io(_))));
    }
}
