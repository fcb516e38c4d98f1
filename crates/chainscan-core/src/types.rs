//! Shared types for the scanning pipeline.

use serde::{Deserialize, Serialize};

// ─── LogEvent ─────────────────────────────────────────────────────────────────

/// One log record emitted by a contract, as returned by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Emitting contract address (`0x…`).
    pub address: String,
    /// Topic hashes in emission order; `topics[0]` is usually the event signature.
    pub topics: Vec<String>,
    /// Block that contains the log.
    pub block_number: u64,
    /// Opaque payload bytes (ABI-encoded, left to the consumer).
    pub data: Vec<u8>,
    /// Transaction hash, when the node reports it.
    pub tx_hash: Option<String>,
    /// Position of the log within its block, when the node reports it.
    pub log_index: Option<u32>,
    /// Hash of the containing block, when the node reports it.
    pub block_hash: Option<String>,
}

impl LogEvent {
    /// Create a log with only the fields the scanner itself relies on.
    pub fn new(address: impl Into<String>, topics: Vec<String>, block_number: u64, data: Vec<u8>) -> Self {
        Self {
            address: address.into(),
            topics,
            block_number,
            data,
            tx_hash: None,
            log_index: None,
            block_hash: None,
        }
    }

    /// The first topic, used together with the address to decide interest.
    pub fn primary_topic(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }

    /// Ordering key inside a result page: block number, then log index.
    pub fn position(&self) -> (u64, u32) {
        (self.block_number, self.log_index.unwrap_or(u32::MAX))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_topic_is_first() {
        let log = LogEvent::new("0xabc", vec!["0xddf2".into(), "0x01".into()], 7, vec![]);
        assert_eq!(log.primary_topic(), Some("0xddf2"));
    }

    #[test]
    fn anonymous_log_has_no_primary_topic() {
        let log = LogEvent::new("0xabc", vec![], 7, vec![0xde, 0xad]);
        assert_eq!(log.primary_topic(), None);
    }

    #[test]
    fn position_orders_by_block_then_index() {
        let mut a = LogEvent::new("0x1", vec![], 10, vec![]);
        a.log_index = Some(3);
        let mut b = LogEvent::new("0x1", vec![], 10, vec![]);
        b.log_index = Some(1);
        let c = LogEvent::new("0x1", vec![], 9, vec![]);
        let mut logs = vec![a.clone(), b.clone(), c.clone()];
        logs.sort_by_key(LogEvent::position);
        assert_eq!(logs, vec![c, b, a]);
    }
}
