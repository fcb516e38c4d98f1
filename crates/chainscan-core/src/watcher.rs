//! Consumer contract: what a watcher supplies to the scanner.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScanError;
use crate::node::LogNode;
use crate::types::LogEvent;

/// Trait implemented by the consumer of a scanner.
///
/// The scanner asks the watcher where to start, how wide each query is,
/// which endpoints to use and which logs it cares about, and hands every
/// interesting log to [`LogWatcher::on_log_event`].
#[async_trait]
pub trait LogWatcher: Send + Sync {
    /// First block to scan when no prior progress exists.
    fn scan_start_block(&self) -> u64;

    /// Number of blocks per `get_logs` query. Zero is treated as one.
    fn per_scan_block_count(&self) -> u64;

    /// Connections to the redundant node pool.
    ///
    /// Called once at the start of every pass; the returned handles are held
    /// for the duration of the pass and dropped when it ends. The order of the
    /// list defines the endpoint indices used for health tracking, so it must
    /// be stable across calls.
    async fn endpoints(&self) -> Result<Vec<Arc<dyn LogNode>>, ScanError>;

    /// Interest predicate over `(address, topics[0])`.
    fn is_interested(&self, address: &str, primary_topic: Option<&str>) -> bool;

    /// Called for every interesting log, in block / log-index order.
    ///
    /// Delivery is at-least-once: an error aborts the pass and logs of the
    /// unfinished batch are delivered again on the next pass.
    async fn on_log_event(&self, event: &LogEvent) -> Result<(), ScanError>;

    /// Delay between passes. Anything at or below one millisecond means no delay.
    fn scan_interval(&self) -> Duration;
}

// ─── InterestSet ──────────────────────────────────────────────────────────────

/// Address / primary-topic interest set.
///
/// A log is interesting when its address is in the address set **or** its
/// primary topic is in the topic set. With both sets empty every log
/// matches. Comparison is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct InterestSet {
    addresses: HashSet<String>,
    topics: HashSet<String>,
}

impl InterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an emitting contract address of interest.
    pub fn add_address(&mut self, address: impl AsRef<str>) {
        self.addresses.insert(address.as_ref().to_ascii_lowercase());
    }

    /// Add an event signature hash (`topics[0]`) of interest.
    pub fn add_topic(&mut self, topic: impl AsRef<str>) {
        self.topics.insert(topic.as_ref().to_ascii_lowercase());
    }

    /// Returns `true` if neither addresses nor topics were registered.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty() && self.topics.is_empty()
    }

    pub fn matches(&self, address: &str, primary_topic: Option<&str>) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.addresses.contains(&address.to_ascii_lowercase()) {
            return true;
        }
        primary_topic.is_some_and(|t| self.topics.contains(&t.to_ascii_lowercase()))
    }
}

// ─── SimpleLogWatcher ─────────────────────────────────────────────────────────

type LogCallback = Box<dyn Fn(&LogEvent) -> Result<(), ScanError> + Send + Sync>;

/// Ready-made watcher over a fixed endpoint list and an [`InterestSet`].
pub struct SimpleLogWatcher {
    endpoints: Vec<Arc<dyn LogNode>>,
    start_block: u64,
    block_count: u64,
    interval: Duration,
    interest: InterestSet,
    callback: LogCallback,
}

impl SimpleLogWatcher {
    pub fn new<F>(endpoints: Vec<Arc<dyn LogNode>>, start_block: u64, callback: F) -> Self
    where
        F: Fn(&LogEvent) -> Result<(), ScanError> + Send + Sync + 'static,
    {
        Self {
            endpoints,
            start_block,
            block_count: 100,
            interval: Duration::from_secs(2),
            interest: InterestSet::new(),
            callback: Box::new(callback),
        }
    }

    /// Set the number of blocks per query.
    pub fn with_block_count(mut self, count: u64) -> Self {
        self.block_count = count;
        self
    }

    /// Set the delay between passes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Replace the interest set.
    pub fn with_interest(mut self, interest: InterestSet) -> Self {
        self.interest = interest;
        self
    }

    pub fn add_interested_address(&mut self, address: impl AsRef<str>) {
        self.interest.add_address(address);
    }

    pub fn add_interested_topic(&mut self, topic: impl AsRef<str>) {
        self.interest.add_topic(topic);
    }
}

#[async_trait]
impl LogWatcher for SimpleLogWatcher {
    fn scan_start_block(&self) -> u64 {
        self.start_block
    }

    fn per_scan_block_count(&self) -> u64 {
        self.block_count
    }

    async fn endpoints(&self) -> Result<Vec<Arc<dyn LogNode>>, ScanError> {
        if self.endpoints.is_empty() {
            return Err(ScanError::Endpoints("no endpoints configured".into()));
        }
        Ok(self.endpoints.clone())
    }

    fn is_interested(&self, address: &str, primary_topic: Option<&str>) -> bool {
        self.interest.matches(address, primary_topic)
    }

    async fn on_log_event(&self, event: &LogEvent) -> Result<(), ScanError> {
        (self.callback)(event)
    }

    fn scan_interval(&self) -> Duration {
        self.interval
    }
}
