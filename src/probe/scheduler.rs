//! Probe scheduler
//!
//! Emits sequentially numbered probes. Each tick either defers (destination
//! not yet resolved, resolution re-attempted without backoff) or registers
//! the next sequence in the pending table and hands the payload to the
//! transport. Registration happens before the send so a failed send still
//! times out and is counted exactly once.

use crate::error::AppError;
use crate::probe::{PendingProbes, SessionStats};
use crate::transport::MeshTransport;
use crate::wire::ProbePayload;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// What a single scheduler tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// Destination unresolved; a resolution attempt was triggered and the
    /// probe deferred to the next tick
    Deferred,

    /// Probe sent and registered
    Sent(u64),

    /// Probe registered but the transport refused the send; the pending
    /// entry stays and will be swept as a loss
    SendFailed { sequence: u64, error: AppError },
}

/// Fixed-interval probe emitter
pub struct ProbeScheduler {
    transport: Arc<dyn MeshTransport>,
    pending: Arc<PendingProbes>,
    stats: Arc<SessionStats>,
    next_sequence: AtomicU64,
}

impl ProbeScheduler {
    pub fn new(
        transport: Arc<dyn MeshTransport>,
        pending: Arc<PendingProbes>,
        stats: Arc<SessionStats>,
    ) -> Self {
        Self {
            transport,
            pending,
            stats,
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Emit one probe, or defer while the destination is unresolved
    pub async fn tick(&self) -> TickOutcome {
        if !self.transport.is_resolved() {
            // Non-blocking path discovery retry; failures defer like
            // unresolved lookups do
            let _ = self.transport.resolve_destination().await;
            if !self.transport.is_resolved() {
                return TickOutcome::Deferred;
            }
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        // Register before sending so the timeout sweep owns the failure path
        self.pending.insert(sequence, Instant::now());
        self.stats.record_sent();

        let payload = match ProbePayload::new(sequence, self.transport.local_address_hex()).encode() {
            Ok(payload) => payload,
            Err(error) => {
                self.stats.record_send_failure();
                return TickOutcome::SendFailed { sequence, error };
            }
        };

        match self.transport.send(&payload).await {
            Ok(()) => TickOutcome::Sent(sequence),
            Err(error) => {
                self.stats.record_send_failure();
                TickOutcome::SendFailed { sequence, error }
            }
        }
    }

    /// Sequence number most recently allocated
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence.load(Ordering::SeqCst)
    }
}
