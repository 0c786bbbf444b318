//! Pending-probe correlation table
//!
//! Maps in-flight sequence numbers to their send timestamps. The scheduler
//! inserts, the collector takes on match, and the sweep evicts on expiry; all
//! three run in different tasks, so every operation holds the one mutex for
//! its whole critical section. A key is consumed by at most one of
//! `take_if_present` and `sweep_expired` — never both.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Synchronized table of probes awaiting a response
#[derive(Debug, Default)]
pub struct PendingProbes {
    inner: Mutex<HashMap<u64, Instant>>,
}

impl PendingProbes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe at its send time
    pub fn insert(&self, sequence: u64, sent_at: Instant) {
        self.lock().insert(sequence, sent_at);
    }

    /// Atomically look up and remove a pending probe
    ///
    /// Returns the send timestamp when the sequence was pending; `None` for
    /// sequences that already resolved or timed out (duplicate/late
    /// responses are idempotent through this).
    pub fn take_if_present(&self, sequence: u64) -> Option<Instant> {
        self.lock().remove(&sequence)
    }

    /// Atomically remove every entry older than `timeout`
    ///
    /// Returns the evicted sequences in ascending order so the caller can
    /// emit exactly one loss event per eviction.
    pub fn sweep_expired(&self, now: Instant, timeout: Duration) -> Vec<u64> {
        let mut table = self.lock();
        let mut expired: Vec<u64> = table
            .iter()
            .filter(|(_, &sent_at)| now.duration_since(sent_at) > timeout)
            .map(|(&seq, _)| seq)
            .collect();
        for seq in &expired {
            table.remove(seq);
        }
        expired.sort_unstable();
        expired
    }

    /// Number of probes currently in flight
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Instant>> {
        // A poisoned table only means a panicking thread held the lock; the
        // map itself is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
