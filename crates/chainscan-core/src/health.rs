//! Endpoint health tracker — per-endpoint cooldown bookkeeping.
//!
//! An endpoint that failed a query is parked until its cooldown instant.
//! Endpoints with no entry are always available.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default cooldown applied after a transient query failure.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Tracks which endpoints are cooling down after a failure.
///
/// Owned by a single scan engine; not shared between watchers.
#[derive(Debug, Default, Clone)]
pub struct EndpointHealth {
    /// endpoint index → instant until which it must not be used
    cooldown_until: HashMap<usize, Instant>,
}

impl EndpointHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that endpoint `index` must not be used until `now + duration`.
    ///
    /// A later call replaces the previous cooldown, even if it is shorter.
    pub fn mark_unavailable(&mut self, index: usize, duration: Duration, now: Instant) {
        self.cooldown_until.insert(index, now + duration);
    }

    /// Forget any cooldown recorded for `index`.
    pub fn clear(&mut self, index: usize) {
        self.cooldown_until.remove(&index);
    }

    /// Returns `true` if `index` is not cooling down at `now`.
    pub fn is_available(&self, index: usize, now: Instant) -> bool {
        match self.cooldown_until.get(&index) {
            Some(until) => now >= *until,
            None => true,
        }
    }

    /// Remaining cooldown for `index`, or `None` if it is available.
    pub fn cooldown_remaining(&self, index: usize, now: Instant) -> Option<Duration> {
        self.cooldown_until
            .get(&index)
            .filter(|until| now < **until)
            .map(|until| *until - now)
    }

    /// Indices in `[0, total)` whose cooldown has elapsed, in ascending order.
    pub fn available_set(&self, total: usize, now: Instant) -> Vec<usize> {
        (0..total).filter(|i| self.is_available(*i, now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_endpoints_are_available() {
        let health = EndpointHealth::new();
        assert_eq!(health.available_set(3, Instant::now()), vec![0, 1, 2]);
    }

    #[test]
    fn cooldown_excludes_until_elapsed() {
        let mut health = EndpointHealth::new();
        let t0 = Instant::now();
        health.mark_unavailable(1, DEFAULT_COOLDOWN, t0);

        assert_eq!(health.available_set(3, t0), vec![0, 2]);
        assert_eq!(
            health.available_set(3, t0 + Duration::from_secs(9)),
            vec![0, 2]
        );
        // cooldown boundary is inclusive of the expiry instant
        assert_eq!(health.available_set(3, t0 + DEFAULT_COOLDOWN), vec![0, 1, 2]);
    }

    #[test]
    fn cooldown_remaining_counts_down() {
        let mut health = EndpointHealth::new();
        let t0 = Instant::now();
        health.mark_unavailable(0, Duration::from_secs(10), t0);
        assert_eq!(
            health.cooldown_remaining(0, t0 + Duration::from_secs(4)),
            Some(Duration::from_secs(6))
        );
        assert_eq!(health.cooldown_remaining(0, t0 + Duration::from_secs(10)), None);
        assert_eq!(health.cooldown_remaining(5, t0), None);
    }

    #[test]
    fn clear_restores_endpoint() {
        let mut health = EndpointHealth::new();
        let t0 = Instant::now();
        health.mark_unavailable(0, Duration::from_secs(60), t0);
        assert!(!health.is_available(0, t0));
        health.clear(0);
        assert!(health.is_available(0, t0));
    }

    #[test]
    fn indices_beyond_total_are_ignored() {
        let mut health = EndpointHealth::new();
        let t0 = Instant::now();
        health.mark_unavailable(7, Duration::from_secs(60), t0);
        assert_eq!(health.available_set(2, t0), vec![0, 1]);
    }
}
