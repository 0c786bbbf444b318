//! In-process loopback transport
//!
//! Plays the base station locally: every probe sent through it is answered
//! with a matching `{"pong": n}` frame after a configurable delay, with
//! optional synthetic link metadata, dropped responses, and duplicate
//! deliveries. Drives the end-to-end tests and the `--loopback` mode.

use crate::error::Result;
use crate::models::LinkQuality;
use crate::transport::{InboundFrame, MeshTransport};
use crate::wire::{self, ResponsePayload, WireMessage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const LOOPBACK_ADDRESS_HEX: &str = "6c6f6f706261636b";

/// Echo responder transport for local runs and tests
pub struct LoopbackTransport {
    inbound: mpsc::Sender<InboundFrame>,
    response_delay: Duration,
    link: Option<LinkQuality>,
    drop_every: Option<u64>,
    duplicate_every: Option<u64>,
    resolve_after: u32,
    resolve_attempts: AtomicU32,
}

impl LoopbackTransport {
    pub fn new(inbound: mpsc::Sender<InboundFrame>) -> Self {
        Self {
            inbound,
            response_delay: Duration::from_millis(20),
            link: None,
            drop_every: None,
            duplicate_every: None,
            resolve_after: 0,
            resolve_attempts: AtomicU32::new(0),
        }
    }

    /// Delay between receiving a probe and emitting the response
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    /// Attach synthetic link metadata to every response frame
    pub fn with_link(mut self, link: LinkQuality) -> Self {
        self.link = Some(link);
        self
    }

    /// Silently drop the response for every Nth probe
    pub fn with_drop_every(mut self, n: u64) -> Self {
        self.drop_every = Some(n);
        self
    }

    /// Deliver the response for every Nth probe twice
    pub fn with_duplicate_every(mut self, n: u64) -> Self {
        self.duplicate_every = Some(n);
        self
    }

    /// Stay unresolved for the first `n` resolution attempts
    pub fn with_resolve_after(mut self, n: u32) -> Self {
        self.resolve_after = n;
        self
    }
}

#[async_trait]
impl MeshTransport for LoopbackTransport {
    fn local_address_hex(&self) -> String {
        LOOPBACK_ADDRESS_HEX.to_string()
    }

    fn is_resolved(&self) -> bool {
        self.resolve_attempts.load(Ordering::SeqCst) > self.resolve_after
    }

    async fn resolve_destination(&self) -> Result<bool> {
        self.resolve_attempts.fetch_add(1, Ordering::SeqCst);
        Ok(self.is_resolved())
    }

    async fn send(&self, payload: &[u8]) -> Result<()> {
        let Some(WireMessage::Probe(probe)) = wire::decode(payload) else {
            return Ok(());
        };

        if let Some(n) = self.drop_every {
            if probe.ping % n == 0 {
                return Ok(());
            }
        }

        let copies = match self.duplicate_every {
            Some(n) if probe.ping % n == 0 => 2,
            _ => 1,
        };

        let inbound = self.inbound.clone();
        let delay = self.response_delay;
        let link = self.link;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let payload = match ResponsePayload::new(probe.ping).encode() {
                Ok(payload) => payload,
                Err(_) => return,
            };
            for _ in 0..copies {
                if inbound.send(InboundFrame::new(payload.clone(), link)).await.is_err() {
                    return;
                }
            }
        });

        Ok(())
    }

    async fn announce(&self, _display_name: &str) -> Result<()> {
        Ok(())
    }
}
