//! Probe correlation engine
//!
//! The scheduler emits numbered probes, the pending table correlates them
//! with responses, and the collector turns matches into measurements. Shared
//! success/failure accounting lives in [`SessionStats`].

pub mod collector;
pub mod pending;
pub mod scheduler;

pub use collector::ResponseCollector;
pub use pending::PendingProbes;
pub use scheduler::ProbeScheduler;

use std::sync::atomic::{AtomicU64, Ordering};

/// Success/failure counters for one measurement session
///
/// Plain counts only; anything beyond success/total is out of scope.
#[derive(Debug, Default)]
pub struct SessionStats {
    sent: AtomicU64,
    succeeded: AtomicU64,
    lost: AtomicU64,
    send_failures: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loss(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures.load(Ordering::Relaxed)
    }

    /// Shutdown summary line, `success/total`
    pub fn summary(&self) -> String {
        format!("{}/{}", self.succeeded(), self.sent())
    }
}
