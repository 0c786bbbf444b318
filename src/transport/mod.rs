//! Transport adapter boundary
//!
//! The mesh transport itself (addressing, path discovery, delivery) is an
//! external collaborator. This module defines the seam the core talks
//! through: a [`MeshTransport`] trait for the outbound side, and a bounded
//! inbound channel the transport pushes [`InboundFrame`]s into so that the
//! transport's own execution context never touches shared state directly.

pub mod loopback;
pub mod udp;

pub use loopback::LoopbackTransport;
pub use udp::UdpTransport;

use crate::error::Result;
use crate::models::LinkQuality;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Depth of the inbound frame queue between transport and collector
pub const INBOUND_QUEUE_DEPTH: usize = 64;

/// An inbound payload plus optional per-frame link-quality metadata
#[derive(Debug, Clone)]
pub struct InboundFrame {
    /// Raw payload bytes as delivered by the transport
    pub payload: Vec<u8>,

    /// RSSI/SNR reported for this frame, when the transport knows them
    pub link: Option<LinkQuality>,
}

impl InboundFrame {
    pub fn new(payload: Vec<u8>, link: Option<LinkQuality>) -> Self {
        Self { payload, link }
    }
}

/// Create the bounded channel connecting a transport to the collector
pub fn inbound_channel() -> (mpsc::Sender<InboundFrame>, mpsc::Receiver<InboundFrame>) {
    mpsc::channel(INBOUND_QUEUE_DEPTH)
}

/// Outbound side of a mesh transport
///
/// Implementations deliver payloads to one destination and feed inbound
/// frames into the channel they were constructed with. All methods are
/// best-effort from the core's point of view; failures are reported, never
/// escalated past the caller.
#[async_trait]
pub trait MeshTransport: Send + Sync {
    /// Hex-encoded local address, placed in outbound probe payloads so the
    /// responder knows where to reply
    fn local_address_hex(&self) -> String;

    /// Whether the destination is currently sendable
    fn is_resolved(&self) -> bool;

    /// Attempt to resolve the destination address (path discovery)
    ///
    /// Returns `Ok(true)` once the destination is sendable. Callers retry on
    /// their own schedule; implementations must not loop internally.
    async fn resolve_destination(&self) -> Result<bool>;

    /// Deliver an outbound payload to the resolved destination
    async fn send(&self, payload: &[u8]) -> Result<()>;

    /// Broadcast a presence announce carrying the display name
    async fn announce(&self, display_name: &str) -> Result<()>;
}
