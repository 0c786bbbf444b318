//! UDP transport adapter
//!
//! Treats a `host:port` pair as the mesh destination: resolution is an async
//! DNS lookup (retried by the scheduler on failure), delivery is a datagram
//! send, and a reader task forwards every received datagram into the inbound
//! channel. UDP reports no per-frame link quality, so frames carry none.

use crate::error::{AppError, Result};
use crate::transport::{InboundFrame, MeshTransport};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::Arc;
use tokio::net::{lookup_host, UdpSocket};
use tokio::sync::mpsc;

const MAX_DATAGRAM: usize = 2048;

/// Mesh transport adapter over a UDP socket
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    destination: String,
    resolved: Mutex<Option<SocketAddr>>,
    local_hex: String,
}

impl UdpTransport {
    /// Bind a local socket and start the inbound reader task
    ///
    /// Fatal on bind failure; everything after startup is best-effort.
    pub async fn bind(destination: String, inbound: mpsc::Sender<InboundFrame>) -> Result<Self> {
        if destination.is_empty() {
            return Err(AppError::config(
                "No destination configured; pass one on the command line or set base_station_destination",
            ));
        }

        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| AppError::transport(format!("Failed to bind UDP socket: {}", e)))?;
        let socket = Arc::new(socket);

        let local = socket
            .local_addr()
            .map_err(|e| AppError::transport(format!("Failed to read local address: {}", e)))?;
        let local_hex = hex_encode(local.to_string().as_bytes());

        spawn_reader(socket.clone(), inbound);

        Ok(Self {
            socket,
            destination,
            resolved: Mutex::new(None),
            local_hex,
        })
    }

    fn resolved_addr(&self) -> Option<SocketAddr> {
        *self.resolved.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MeshTransport for UdpTransport {
    fn local_address_hex(&self) -> String {
        self.local_hex.clone()
    }

    fn is_resolved(&self) -> bool {
        self.resolved_addr().is_some()
    }

    async fn resolve_destination(&self) -> Result<bool> {
        if self.is_resolved() {
            return Ok(true);
        }

        let mut addrs = lookup_host(&self.destination)
            .await
            .map_err(|e| AppError::resolution(format!("Lookup of {} failed: {}", self.destination, e)))?;

        match addrs.next() {
            Some(addr) => {
                *self.resolved.lock().unwrap_or_else(|e| e.into_inner()) = Some(addr);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn send(&self, payload: &[u8]) -> Result<()> {
        let addr = self
            .resolved_addr()
            .ok_or_else(|| AppError::resolution(format!("Destination {} not resolved", self.destination)))?;

        self.socket
            .send_to(payload, addr)
            .await
            .map_err(|e| AppError::transport(format!("Send to {} failed: {}", addr, e)))?;
        Ok(())
    }

    async fn announce(&self, display_name: &str) -> Result<()> {
        let payload = serde_json::json!({
            "announce": display_name,
            "from": self.local_hex,
        });
        self.send(payload.to_string().as_bytes()).await
    }
}

/// Forward every received datagram into the inbound channel
///
/// The task ends when the collector side of the channel is dropped.
fn spawn_reader(socket: Arc<UdpSocket>, inbound: mpsc::Sender<InboundFrame>) {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = match socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(_) => break,
            };
            let frame = InboundFrame::new(buf[..len].to_vec(), None);
            if inbound.send(frame).await.is_err() {
                break;
            }
        }
    });
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
