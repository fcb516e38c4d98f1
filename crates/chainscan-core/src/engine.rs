//! The scan engine — one pass of the block-advancing loop.
//!
//! # Pass
//! Starting at the cursor, repeatedly:
//!   - select a healthy endpoint (`available[block % len]`)
//!   - query logs for `[current, current + width - 1]`
//!   - on error: cool the endpoint down and retry elsewhere
//!   - on an empty page: decide between "empty but mined" and "not yet mined"
//!   - on logs: deliver interesting ones, commit up to the highest block seen
//!
//! A pass ends when no endpoint is available, the chain tip is reached, the
//! consumer callback fails, or the engine is cancelled.
//!
//! # Tentative progress
//! While the tip-check gate is closed, an empty page is accepted without a
//! height check and only the pass-local position moves forward. Those blocks
//! are never committed as they stand: once a page has to be verified (or
//! returns logs) while such unverified blocks lie behind the position, the
//! pass rewinds to the cursor and scans them again with height checks.
//!
//! An empty page is verified against a height observed *before* the query
//! was sent. A check that finds the node at or past the block therefore
//! records the height and repeats the query; a check that finds the node
//! behind ends the pass with the cursor where it was.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::cursor::ScanCursor;
use crate::error::ScanError;
use crate::health::EndpointHealth;
use crate::node::LogNode;
use crate::rotator::EndpointRotator;
use crate::types::LogEvent;
use crate::watcher::LogWatcher;

/// Why a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStop {
    /// Every endpoint is cooling down.
    NoEndpoints,
    /// The node has not produced the next block yet.
    NotYetMined { height: u64 },
    /// The watcher could not provide endpoints.
    EndpointsUnavailable,
    /// The consumer callback returned an error.
    HandlerFailed,
    /// The engine's cancellation token fired.
    Cancelled,
}

impl std::fmt::Display for PassStop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEndpoints => write!(f, "no-endpoints"),
            Self::NotYetMined { height } => write!(f, "not-yet-mined(height={height})"),
            Self::EndpointsUnavailable => write!(f, "endpoints-unavailable"),
            Self::HandlerFailed => write!(f, "handler-failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one pass.
#[derive(Debug)]
pub struct PassOutcome {
    /// Highest block confirmed during this pass, `None` if nothing was.
    pub last_confirmed: Option<u64>,
    pub stop: PassStop,
    /// Set when the pass failed (callback or endpoint acquisition).
    pub error: Option<ScanError>,
    /// Number of logs handed to the consumer.
    pub delivered: usize,
}

impl PassOutcome {
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    pub fn progressed(&self) -> bool {
        self.last_confirmed.is_some()
    }
}

/// Verdict on one empty page that needs a height check.
enum EmptyPage {
    /// The node had produced the block before the query was sent.
    Mined,
    /// The node has produced the block, but possibly only after the query;
    /// query it again.
    Recheck,
    NotYetMined(u64),
    /// The height query itself failed.
    Failed(ScanError),
}

/// Scan engine for one watcher.
///
/// Owns the cursor and the endpoint health map; run one engine per watcher.
pub struct ScanEngine {
    watcher: Arc<dyn LogWatcher>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    health: EndpointHealth,
    cursor: ScanCursor,
    cancel: CancellationToken,
}

impl ScanEngine {
    /// Create an engine on the system clock, starting at the watcher's start block.
    pub fn new(watcher: Arc<dyn LogWatcher>, config: EngineConfig) -> Self {
        Self::with_clock(watcher, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        watcher: Arc<dyn LogWatcher>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cursor = ScanCursor::new(watcher.scan_start_block(), clock.now());
        Self {
            watcher,
            config,
            clock,
            health: EndpointHealth::new(),
            cursor,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the cancellation token checked between iterations.
    pub fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }

    pub fn health(&self) -> &EndpointHealth {
        &self.health
    }

    pub fn watcher(&self) -> &Arc<dyn LogWatcher> {
        &self.watcher
    }

    /// Chain id of the first endpoint.
    pub async fn chain_id(&self) -> Result<u64, ScanError> {
        let endpoints = self.watcher.endpoints().await?;
        let node = endpoints
            .first()
            .ok_or_else(|| ScanError::Endpoints("watcher returned no endpoints".into()))?;
        self.call(node.chain_id()).await
    }

    /// Run one pass starting at `start` (or at the cursor, if it is further).
    pub async fn run_pass(&mut self, start: u64) -> PassOutcome {
        self.cursor.seek(start);
        let pass_start = self.cursor.next_block();
        let mut delivered = 0usize;

        // Endpoint handles live for this pass only and are dropped on return.
        let endpoints = match self.watcher.endpoints().await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::warn!(error = %e, "failed to acquire endpoints");
                return self.outcome(pass_start, PassStop::EndpointsUnavailable, Some(e), 0);
            }
        };
        let rotator = EndpointRotator::new(endpoints.len());
        let width = self.watcher.per_scan_block_count().max(1);
        let mut current = pass_start;
        // blocks below this were skipped unverified and must be checked again
        let mut verify_below = pass_start;
        // endpoint index -> height it reported, observed before later queries
        let mut known = HashMap::new();

        let (stop, error) = loop {
            if self.cancel.is_cancelled() {
                break (PassStop::Cancelled, None);
            }

            let now = self.clock.now();
            let Some(index) = rotator.select(&self.health, current, now) else {
                tracing::info!(block = current, "no endpoint available");
                break (PassStop::NoEndpoints, None);
            };
            let node = &endpoints[index];
            let to = current.saturating_add(width - 1);

            tracing::debug!(from = current, to, endpoint = index, "querying logs");
            let logs = match self.call(node.get_logs(current, to)).await {
                Ok(logs) => logs,
                Err(e) => {
                    self.cool_down(index, node.as_ref(), &e);
                    continue;
                }
            };
            let logs = in_range(logs, current, to);
            let unverified = current > self.cursor.next_block();

            if logs.is_empty() && !self.needs_check(current, verify_below) {
                current += 1;
                continue;
            }
            if unverified {
                tracing::debug!(
                    from = self.cursor.next_block(),
                    to = current - 1,
                    "rescanning blocks skipped without a height check"
                );
                verify_below = verify_below.max(current);
                current = self.cursor.next_block();
                continue;
            }

            if logs.is_empty() {
                match self.check_empty(index, node.as_ref(), current, &mut known).await {
                    EmptyPage::Mined => {
                        self.cursor.seek(current + 1);
                        current += 1;
                    }
                    EmptyPage::Recheck => {}
                    EmptyPage::NotYetMined(height) => {
                        tracing::debug!(block = current, height, "chain tip reached");
                        break (PassStop::NotYetMined { height }, None);
                    }
                    EmptyPage::Failed(e) => self.cool_down(index, node.as_ref(), &e),
                }
                continue;
            }

            let mut failure = None;
            for log in &logs {
                if !self.watcher.is_interested(&log.address, log.primary_topic()) {
                    continue;
                }
                if let Err(e) = self.watcher.on_log_event(log).await {
                    tracing::warn!(
                        block = log.block_number,
                        address = %log.address,
                        error = %e,
                        "log handler failed, aborting pass"
                    );
                    failure = Some(e);
                    break;
                }
                delivered += 1;
            }
            if let Some(e) = failure {
                break (PassStop::HandlerFailed, Some(e));
            }

            let highest = logs.last().map(|l| l.block_number).unwrap_or(current);
            self.cursor.advance_to(highest, self.clock.now());
            tracing::debug!(from = current, to, highest, logs = logs.len(), "range processed");
            current = highest + 1;
        };

        let outcome = self.outcome(pass_start, stop, error, delivered);
        tracing::info!(
            start = pass_start,
            next = self.cursor.next_block(),
            delivered,
            stop = %outcome.stop,
            "scan pass finished"
        );
        outcome
    }

    /// Whether an empty page at `current` must be checked against the height.
    fn needs_check(&self, current: u64, verify_below: u64) -> bool {
        current < verify_below
            || self.cursor.since_forward(self.clock.now()) >= self.config.tip_check_after
    }

    async fn check_empty(
        &self,
        index: usize,
        node: &dyn LogNode,
        current: u64,
        known: &mut HashMap<usize, u64>,
    ) -> EmptyPage {
        if known.get(&index).is_some_and(|height| *height >= current) {
            return EmptyPage::Mined;
        }
        match self.call(node.block_number()).await {
            Ok(height) if height < current => EmptyPage::NotYetMined(height),
            Ok(height) => {
                known.insert(index, height);
                EmptyPage::Recheck
            }
            Err(e) => EmptyPage::Failed(e),
        }
    }

    fn cool_down(&mut self, index: usize, node: &dyn LogNode, error: &ScanError) {
        let cooldown = self.config.endpoint_cooldown;
        self.health.mark_unavailable(index, cooldown, self.clock.now());
        tracing::warn!(
            endpoint = index,
            url = node.url(),
            cooldown_secs = cooldown.as_secs(),
            error = %error,
            "endpoint query failed, cooling down"
        );
    }

    async fn call<T>(&self, fut: impl Future<Output = Result<T, ScanError>>) -> Result<T, ScanError> {
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ScanError::Timeout {
                    ms: limit.as_millis() as u64,
                })?,
            None => fut.await,
        }
    }

    fn outcome(
        &self,
        pass_start: u64,
        stop: PassStop,
        error: Option<ScanError>,
        delivered: usize,
    ) -> PassOutcome {
        let last_confirmed = self
            .cursor
            .last_confirmed()
            .filter(|_| self.cursor.next_block() > pass_start);
        PassOutcome {
            last_confirmed,
            stop,
            error,
            delivered,
        }
    }
}

/// Keep logs inside `[from, to]`, ordered by block and log index.
fn in_range(logs: Vec<LogEvent>, from: u64, to: u64) -> Vec<LogEvent> {
    let total = logs.len();
    let mut kept: Vec<LogEvent> = logs
        .into_iter()
        .filter(|l| (from..=to).contains(&l.block_number))
        .collect();
    if kept.len() != total {
        tracing::warn!(from, to, dropped = total - kept.len(), "node returned logs outside the queried range");
    }
    kept.sort_by_key(LogEvent::position);
    kept
}
