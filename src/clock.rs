//! Monotonic millisecond clock
//!
//! Wall-clock milliseconds that never repeat or go backwards within one process, so
//! creation order of perspectives stays total even when two are created in the same
//! millisecond.

use crate::entry::codec::compute_hash;
use crate::types::{now_millis, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static INSTANCES: AtomicU64 = AtomicU64::new(0);

/// Starting value for a per-instance counter, distinct across processes and instances.
///
/// Hashes the process id, the wall clock in nanoseconds and a process-wide instance count.
pub fn instance_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut bytes = Vec::with_capacity(28);
    bytes.extend_from_slice(&std::process::id().to_le_bytes());
    bytes.extend_from_slice(&nanos.to_le_bytes());
    bytes.extend_from_slice(&INSTANCES.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let hash = compute_hash(&bytes);
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed)
}

#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp: `max(now, last + 1)`
    pub fn now(&self) -> Timestamp {
        let wall = now_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => last = observed,
            }
        }
    }
}
