//! Wire payloads exchanged over the mesh transport
//!
//! Probes carry `{"ping": <sequence>, "from": <senderHex>}` and responses
//! carry `{"pong": <sequence>}`, both as compact JSON. Anything that does not
//! decode into one of these shapes is treated as foreign traffic and dropped.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Outbound probe payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePayload {
    /// Probe sequence number, starting at 1
    pub ping: u64,

    /// Hex-encoded sender address the responder should reply to
    pub from: String,
}

impl ProbePayload {
    pub fn new(ping: u64, from: impl Into<String>) -> Self {
        Self { ping, from: from.into() }
    }

    /// Encode to the wire representation
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| AppError::internal(format!("Probe encode failed: {}", e)))
    }
}

/// Inbound response payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Sequence number of the probe being acknowledged
    pub pong: u64,
}

impl ResponsePayload {
    pub fn new(pong: u64) -> Self {
        Self { pong }
    }

    /// Encode to the wire representation
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| AppError::internal(format!("Response encode failed: {}", e)))
    }
}

/// Any message understood by either end of a range test
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    Probe(ProbePayload),
    Response(ResponsePayload),
}

/// Decode an inbound payload, tolerating foreign traffic
///
/// Returns `None` for anything that is not a well-formed probe or response;
/// malformed input is never an error at this boundary.
pub fn decode(payload: &[u8]) -> Option<WireMessage> {
    #[derive(Deserialize)]
    struct Raw {
        ping: Option<u64>,
        from: Option<String>,
        pong: Option<u64>,
    }

    let raw: Raw = serde_json::from_slice(payload).ok()?;
    if let Some(pong) = raw.pong {
        return Some(WireMessage::Response(ResponsePayload { pong }));
    }
    if let (Some(ping), Some(from)) = (raw.ping, raw.from) {
        return Some(WireMessage::Probe(ProbePayload { ping, from }));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_encode_decode() {
        let probe = ProbePayload::new(42, "ca60113e441aa89f");
        let bytes = probe.encode().unwrap();
        assert_eq!(decode(&bytes), Some(WireMessage::Probe(probe)));
    }

    #[test]
    fn test_response_encode_decode() {
        let pong = ResponsePayload::new(7);
        let bytes = pong.encode().unwrap();
        assert_eq!(decode(&bytes), Some(WireMessage::Response(pong)));
    }

    #[test]
    fn test_malformed_payloads_decode_to_none() {
        assert_eq!(decode(b"not json"), None);
        assert_eq!(decode(b"{}"), None);
        assert_eq!(decode(b"{\"ping\": 1}"), None); // probe without sender
        assert_eq!(decode(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_pong_takes_precedence_over_partial_probe() {
        // A frame carrying both fields is treated as a response
        let msg = decode(br#"{"pong": 3, "ping": 9, "from": "aa"}"#);
        assert_eq!(msg, Some(WireMessage::Response(ResponsePayload::new(3))));
    }
}
