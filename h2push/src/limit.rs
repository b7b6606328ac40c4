use tracing::{info, warn};

use crate::session::Session;

/// Upper bound applied to whatever concurrency the peer advertises
pub const CONCURRENT_STREAMS_SAFETY_MAXIMUM: usize = 1000;

/// Tracks the peer's SETTINGS_MAX_CONCURRENT_STREAMS and derives the number of streams the
/// scheduler keeps open
///
/// The effective limit always lies in `1..=CONCURRENT_STREAMS_SAFETY_MAXIMUM`: zero would stall
/// the scheduler, and an absurdly large value would let queued stream handles grow unbounded.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    previous_raw: Option<usize>,
    effective: usize,
}

impl Default for ConcurrencyLimit {
    fn default() -> Self {
        Self {
            previous_raw: None,
            effective: 1,
        }
    }
}

impl ConcurrencyLimit {
    pub fn new() -> Self {
        Default::default()
    }

    /// Re-read the peer's limit from the session. Returns whether the effective limit changed.
    pub fn refresh<S: Session + ?Sized>(&mut self, session: &S) -> bool {
        self.observe(session.peer_concurrency_limit())
    }

    /// Apply a raw value as advertised by the peer. Returns whether the effective limit changed.
    pub fn observe(&mut self, raw: usize) -> bool {
        if self.previous_raw == Some(raw) {
            return false;
        }
        self.previous_raw = Some(raw);

        let previous = self.effective;
        self.effective = if raw > CONCURRENT_STREAMS_SAFETY_MAXIMUM {
            warn!(
                raw,
                maximum = CONCURRENT_STREAMS_SAFETY_MAXIMUM,
                "peer max_concurrent_streams too high, resorting to the safety maximum"
            );
            CONCURRENT_STREAMS_SAFETY_MAXIMUM
        } else if raw < 1 {
            warn!(raw, "peer max_concurrent_streams less than 1, using 1");
            1
        } else {
            info!(raw, "peer set max_concurrent_streams");
            raw
        };
        self.effective != previous
    }

    /// Number of streams that may be open at once
    pub fn current(&self) -> usize {
        self.effective
    }

    /// Last raw value seen from the peer
    pub fn raw(&self) -> Option<usize> {
        self.previous_raw
    }
}
