//! Response collector
//!
//! Single consumer of the inbound frame channel. Each frame is decoded,
//! correlated against the pending table, timed, annotated by the telemetry
//! sampler, and appended to the measurement log. Malformed frames and
//! responses with no pending probe are discarded silently, which makes
//! duplicate and late delivery idempotent.

use crate::measurement::MeasurementLog;
use crate::models::MeasurementEntry;
use crate::probe::{PendingProbes, SessionStats};
use crate::telemetry::TelemetrySampler;
use crate::transport::InboundFrame;
use crate::wire::{self, WireMessage};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What processing one inbound frame did
#[derive(Debug)]
pub enum CollectOutcome {
    /// Frame was not a well-formed response; dropped
    Ignored,

    /// Response for a sequence that is no longer pending (duplicate or
    /// late); dropped
    Unmatched(u64),

    /// Measurement recorded
    Recorded(MeasurementEntry),

    /// Response matched and counted, but the strict GPS policy discarded
    /// the entry for lack of a fix
    Discarded { sequence: u64, rtt: Duration },
}

/// Turns inbound response frames into measurement entries
pub struct ResponseCollector {
    pending: Arc<PendingProbes>,
    stats: Arc<SessionStats>,
    sampler: TelemetrySampler,
    log: Arc<MeasurementLog>,
}

impl ResponseCollector {
    pub fn new(
        pending: Arc<PendingProbes>,
        stats: Arc<SessionStats>,
        sampler: TelemetrySampler,
        log: Arc<MeasurementLog>,
    ) -> Self {
        Self {
            pending,
            stats,
            sampler,
            log,
        }
    }

    /// Process one inbound frame
    ///
    /// A store write failure is reported through the `Recorded` outcome's
    /// entry having been kept in memory; the error itself is surfaced by the
    /// measurement log and handled by the caller's reporter.
    pub async fn process(&self, frame: InboundFrame) -> CollectOutcome {
        let Some(WireMessage::Response(response)) = wire::decode(&frame.payload) else {
            return CollectOutcome::Ignored;
        };

        let Some(sent_at) = self.pending.take_if_present(response.pong) else {
            return CollectOutcome::Unmatched(response.pong);
        };

        // saturating: a clock hiccup must never produce a negative rtt
        let rtt = Instant::now().saturating_duration_since(sent_at);
        self.stats.record_success();

        // A link report with neither metric carries nothing worth keeping
        let link = frame.link.filter(|link| !link.is_empty());
        let sample = self.sampler.sample(link).await;
        if !self.sampler.admits(&sample) {
            return CollectOutcome::Discarded {
                sequence: response.pong,
                rtt,
            };
        }

        let entry = MeasurementEntry::new(response.pong, rtt, sample.gps, sample.link);
        if let Err(e) = self.log.append(entry.clone()) {
            // Entry is in memory; only the sidecar write failed
            eprintln!("Measurement store write failed: {}", e);
        }
        CollectOutcome::Recorded(entry)
    }
}
