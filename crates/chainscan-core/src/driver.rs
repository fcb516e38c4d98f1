//! The scan loop driver — runs passes until cancelled.
//!
//! Each iteration runs one engine pass from the last confirmed block, counts
//! errored passes, backs off once the error threshold is reached, then
//! waits the watcher's scan interval. Cancellation is cooperative: the token
//! is checked between passes, inside the engine, and during every sleep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{DriverConfig, POLL_TICK};
use crate::engine::{PassOutcome, ScanEngine};

/// Consecutive-error circuit breaker.
#[derive(Debug, Clone)]
pub struct ErrorBreaker {
    threshold: u32,
    consecutive: u32,
}

impl ErrorBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive: 0,
        }
    }

    /// Current count of consecutive errored passes.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Record a pass result. Returns `true` when the threshold is reached;
    /// the counter is reset at that point.
    pub fn record(&mut self, errored: bool) -> bool {
        if !errored {
            self.consecutive = 0;
            return false;
        }
        self.consecutive += 1;
        if self.consecutive >= self.threshold {
            self.consecutive = 0;
            return true;
        }
        false
    }
}

/// What one driver iteration did.
#[derive(Debug)]
pub struct StepReport {
    pub outcome: PassOutcome,
    /// Backoff to apply before the next pass, if the breaker tripped.
    pub backoff: Option<Duration>,
}

/// Drives a [`ScanEngine`] indefinitely.
pub struct ScanDriver {
    engine: ScanEngine,
    config: DriverConfig,
    breaker: ErrorBreaker,
    next_start: u64,
    cancel: CancellationToken,
}

impl ScanDriver {
    pub fn new(mut engine: ScanEngine, config: DriverConfig) -> Self {
        let cancel = CancellationToken::new();
        engine.set_cancellation(cancel.clone());
        let next_start = engine.cursor().next_block();
        Self {
            engine,
            breaker: ErrorBreaker::new(config.error_threshold),
            config,
            next_start,
            cancel,
        }
    }

    /// A token that stops the driver when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// First block of the next pass.
    pub fn next_start(&self) -> u64 {
        self.next_start
    }

    /// Last block confirmed across all passes.
    pub fn last_scanned(&self) -> Option<u64> {
        self.next_start.checked_sub(1)
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.breaker.consecutive()
    }

    pub fn engine(&self) -> &ScanEngine {
        &self.engine
    }

    /// Run one pass and update the driver state.
    pub async fn step(&mut self) -> StepReport {
        let outcome = self.engine.run_pass(self.next_start).await;

        // partial progress survives a failed pass
        if let Some(block) = outcome.last_confirmed {
            self.next_start = block + 1;
        }
        if let Some(e) = &outcome.error {
            tracing::warn!(
                error = %e,
                next = self.next_start,
                consecutive = self.breaker.consecutive() + 1,
                "scan pass failed"
            );
        }

        let backoff = self
            .breaker
            .record(outcome.is_err())
            .then_some(self.config.error_backoff);
        if let Some(delay) = backoff {
            tracing::error!(
                threshold = self.config.error_threshold,
                backoff_secs = delay.as_secs(),
                "scan pass failing continuously, backing off"
            );
        }
        StepReport { outcome, backoff }
    }

    /// Run passes until the cancellation token fires.
    pub async fn run(&mut self) {
        tracing::info!(start = self.next_start, "log scanner starting");
        match self.engine.chain_id().await {
            Ok(chain_id) => tracing::info!(chain_id, "connected, scanning"),
            Err(e) => tracing::warn!(error = %e, "chain id lookup failed, scanning anyway"),
        }

        while !self.cancel.is_cancelled() {
            let report = self.step().await;
            if let Some(backoff) = report.backoff {
                if !self.sleep(backoff).await {
                    break;
                }
            }
            let interval = self.engine.watcher().scan_interval();
            if interval > POLL_TICK && !self.sleep(interval).await {
                break;
            }
        }
        tracing::info!(next = self.next_start, "log scanner stopped");
    }

    /// Sleep for `duration`; returns `false` if cancelled first.
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
