//! Deterministic endpoint selection among healthy endpoints.

use std::time::Instant;

use crate::health::EndpointHealth;

/// Picks one endpoint per query from the currently available set.
///
/// Selection is `available[block % available.len()]`, which spreads
/// consecutive ranges over healthy endpoints while staying reproducible for
/// a given block number and health state.
#[derive(Debug, Clone, Copy)]
pub struct EndpointRotator {
    total: usize,
}

impl EndpointRotator {
    /// Create a rotator over `total` endpoints (indices `0..total`).
    pub fn new(total: usize) -> Self {
        Self { total }
    }

    /// Number of endpoints this rotator spans.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Indices that are not cooling down at `now`.
    pub fn available(&self, health: &EndpointHealth, now: Instant) -> Vec<usize> {
        health.available_set(self.total, now)
    }

    /// Select the endpoint for `block`, or `None` if every endpoint is
    /// cooling down.
    pub fn select(&self, health: &EndpointHealth, block: u64, now: Instant) -> Option<usize> {
        pick(&self.available(health, now), block)
    }
}

/// `available[block mod len]`, or `None` for an empty set.
pub fn pick(available: &[usize], block: u64) -> Option<usize> {
    if available.is_empty() {
        return None;
    }
    let slot = (block % available.len() as u64) as usize;
    Some(available[slot])
}
