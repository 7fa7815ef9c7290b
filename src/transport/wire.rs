//! Mesh wire protocol
//!
//! Frames exchanged between participants in the TCP mesh. MessagePack
//! (rmp-serde) is used for the body, prefixed with a 4-byte little-endian
//! length field:
//!
//! ```text
//! [4 bytes: message length (little-endian u32)][N bytes: MessagePack message]
//! ```
//!
//! # Message Flow
//!
//! ```text
//! dialer                          acceptor
//!   |--------- Hello --------------->|      (per link, at bootstrap)
//!   |<-------- Hello ----------------|
//!
//! rank 0                          rank r
//!   |--------- Matrix -------------->|      (broadcast)
//!   |<======== Vector ==============>|      (N-1 exchange rounds)
//!   |<-------- Vector ---------------|      (gather at rank 0)
//! ```
//!
//! An `Abort` frame may arrive at any point and takes down the receiving
//! participant; it is how a failing process propagates the uniform abort.

use crate::graph::{AdjacencyMatrix, Weight};
use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Protocol version.
///
/// Increment on breaking changes; every Hello carries it and a mismatch is a
/// fatal precondition failure.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on a single frame. Far above any realistic matrix for the
/// graph sizes this tool targets; anything larger is a corrupt length prefix.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Protocol message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// Link handshake, exchanged both ways when a mesh connection opens.
    Hello(HelloMessage),

    /// The adjacency matrix, broadcast from the initiator.
    Matrix(AdjacencyMatrix),

    /// One participant's full distance vector.
    Vector(VectorMessage),

    /// Coordinated abort: the whole computation is invalid, shut down.
    Abort(AbortMessage),
}

/// Link handshake message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    /// Protocol version (must match on both ends)
    pub protocol_version: u32,

    /// Sender's rank
    pub rank: usize,

    /// Participant count the sender expects
    pub size: usize,

    /// Sender's hostname, for diagnostics only
    pub node: String,
}

/// Distance vector message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMessage {
    /// Sender's rank
    pub from: usize,

    /// The sender's full current distance vector
    pub distances: Vec<Weight>,
}

/// Abort message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbortMessage {
    /// Rank that initiated the abort
    pub from: usize,

    /// Human-readable reason
    pub reason: String,
}

/// Serialize a message with its length prefix.
pub fn serialize_message(msg: &Message) -> Result<Vec<u8>, TransportError> {
    let body = rmp_serde::to_vec(msg)
        .map_err(|e| TransportError::Protocol(format!("failed to serialize message: {}", e)))?;

    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    framed.extend_from_slice(&body);

    Ok(framed)
}

/// Deserialize a message from a buffer holding at least one complete frame.
///
/// Returns the message and the number of bytes consumed, prefix included.
pub fn deserialize_message(buf: &[u8]) -> Result<(Message, usize), TransportError> {
    if buf.len() < 4 {
        return Err(TransportError::Protocol(format!(
            "buffer too small for length prefix (need 4 bytes, got {})",
            buf.len()
        )));
    }

    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::Protocol(format!(
            "frame too large: {} bytes (max {})",
            len, MAX_FRAME_BYTES
        )));
    }
    if buf.len() < 4 + len {
        return Err(TransportError::Protocol(format!(
            "incomplete frame (need {} bytes, got {})",
            4 + len,
            buf.len()
        )));
    }

    let msg = rmp_serde::from_slice(&buf[4..4 + len])
        .map_err(|e| TransportError::Protocol(format!("failed to deserialize message: {}", e)))?;

    Ok((msg, 4 + len))
}

/// Read one complete message from a stream. Blocks until the frame arrives.
pub fn read_message<R: Read>(stream: &mut R) -> Result<Message, TransportError> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::Protocol(format!(
            "frame too large: {} bytes (max {})",
            len, MAX_FRAME_BYTES
        )));
    }

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body)?;

    rmp_serde::from_slice(&body)
        .map_err(|e| TransportError::Protocol(format!("failed to deserialize message: {}", e)))
}

/// Write one message to a stream and flush it.
pub fn write_message<W: Write>(stream: &mut W, msg: &Message) -> Result<(), TransportError> {
    let framed = serialize_message(msg)?;
    stream.write_all(&framed)?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::UNREACHABLE;
    use std::io::Cursor;

    #[test]
    fn test_serialize_deserialize_hello() {
        let msg = Message::Hello(HelloMessage {
            protocol_version: PROTOCOL_VERSION,
            rank: 2,
            size: 7,
            node: "node-a".to_string(),
        });

        let bytes = serialize_message(&msg).unwrap();
        let (decoded, consumed) = deserialize_message(&bytes).unwrap();

        assert_eq!(consumed, bytes.len());
        match decoded {
            Message::Hello(hello) => {
                assert_eq!(hello.protocol_version, PROTOCOL_VERSION);
                assert_eq!(hello.rank, 2);
                assert_eq!(hello.size, 7);
                assert_eq!(hello.node, "node-a");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_serialize_deserialize_vector() {
        let msg = Message::Vector(VectorMessage {
            from: 3,
            distances: vec![0, 4, UNREACHABLE, 1],
        });

        let bytes = serialize_message(&msg).unwrap();
        let (decoded, _) = deserialize_message(&bytes).unwrap();

        match decoded {
            Message::Vector(v) => {
                assert_eq!(v.from, 3);
                assert_eq!(v.distances, vec![0, 4, UNREACHABLE, 1]);
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_serialize_deserialize_matrix() {
        let matrix = crate::graph::AdjacencyMatrix::from_rows(&[
            vec![0, 1, UNREACHABLE],
            vec![1, 0, 2],
            vec![UNREACHABLE, 2, 0],
        ])
        .unwrap();

        let bytes = serialize_message(&Message::Matrix(matrix.clone())).unwrap();
        let (decoded, _) = deserialize_message(&bytes).unwrap();

        match decoded {
            Message::Matrix(m) => assert_eq!(m, matrix),
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_message_framing() {
        let msg = Message::Abort(AbortMessage {
            from: 0,
            reason: "test".to_string(),
        });
        let bytes = serialize_message(&msg).unwrap();

        assert!(bytes.len() >= 4);
        let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        assert_eq!(bytes.len(), 4 + len);
    }

    #[test]
    fn test_deserialize_truncated() {
        let msg = Message::Vector(VectorMessage {
            from: 0,
            distances: vec![1, 2, 3],
        });
        let bytes = serialize_message(&msg).unwrap();

        assert!(deserialize_message(&bytes[..2]).is_err());
        assert!(deserialize_message(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_read_rejects_oversized_frame() {
        let mut bad = Vec::new();
        bad.extend_from_slice(&(u32::MAX).to_le_bytes());
        bad.extend_from_slice(&[0u8; 16]);

        let mut cursor = Cursor::new(bad);
        assert!(read_message(&mut cursor).is_err());
    }

    #[test]
    fn test_stream_round_trip() {
        let msg = Message::Vector(VectorMessage {
            from: 1,
            distances: vec![0, 5, 9],
        });

        let mut buf = Vec::new();
        write_message(&mut buf, &msg).unwrap();

        let mut cursor = Cursor::new(buf);
        match read_message(&mut cursor).unwrap() {
            Message::Vector(v) => assert_eq!(v.distances, vec![0, 5, 9]),
            _ => panic!("Wrong message type"),
        }
    }
}
