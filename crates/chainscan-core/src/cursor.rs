//! Scan cursor: the next block to query and the time of the last forward progress.

use std::time::{Duration, Instant};

/// The scanner's position in the chain.
///
/// `next_block` only ever moves forward. `last_forward` is the instant the
/// cursor last advanced and gates the chain-tip height check.
#[derive(Debug, Clone)]
pub struct ScanCursor {
    next_block: u64,
    last_forward: Instant,
}

impl ScanCursor {
    /// Create a cursor whose next block to scan is `start`.
    pub fn new(start: u64, now: Instant) -> Self {
        Self {
            next_block: start,
            last_forward: now,
        }
    }

    /// Next block to query.
    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    /// Instant of the last forward move.
    pub fn last_forward(&self) -> Instant {
        self.last_forward
    }

    /// Last block confirmed as processed, or `None` if the cursor still sits
    /// on block 0.
    pub fn last_confirmed(&self) -> Option<u64> {
        self.next_block.checked_sub(1)
    }

    /// Time elapsed since the cursor last moved forward.
    pub fn since_forward(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_forward)
    }

    /// Mark `block` as processed: `next_block = block + 1`.
    ///
    /// Returns `false` (and leaves the cursor untouched) if that would not
    /// move the cursor forward.
    pub fn advance_to(&mut self, block: u64, now: Instant) -> bool {
        let next = block.saturating_add(1);
        if next <= self.next_block {
            return false;
        }
        self.next_block = next;
        self.last_forward = now;
        true
    }

    /// Jump forward to `start`, treating every block below it as handled:
    /// afterwards `last_confirmed` reports `start - 1`.
    ///
    /// Unlike [`advance_to`](Self::advance_to) this leaves `last_forward`
    /// alone. Used when the driver resumes from a position ahead of the
    /// cursor and for blocks verified to be empty.
    pub fn seek(&mut self, start: u64) {
        if start > self.next_block {
            self.next_block = start;
        }
    }
}
