//! Shared fakes for the scenario tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chainscan_core::{LogEvent, LogNode, ScanError};

pub const TRANSFER: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
pub const APPROVAL: &str = "0x8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925";
pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// Scripted response for one `get_logs` call.
pub enum Reply {
    Fail(&'static str),
    /// Serve whatever the simulated chain holds.
    Chain,
}

/// Node over a simulated chain, with an optional script of leading replies.
pub struct ScriptedNode {
    name: String,
    height: AtomicU64,
    chain: Mutex<Vec<LogEvent>>,
    script: Mutex<VecDeque<Reply>>,
    queries: Mutex<Vec<(u64, u64)>>,
}

impl ScriptedNode {
    pub fn new(name: &str, height: u64, chain: Vec<LogEvent>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            height: AtomicU64::new(height),
            chain: Mutex::new(chain),
            script: Mutex::new(VecDeque::new()),
            queries: Mutex::new(vec![]),
        })
    }

    pub fn script(&self, replies: impl IntoIterator<Item = Reply>) {
        self.script.lock().unwrap().extend(replies);
    }

    /// Produce new blocks (and their logs).
    pub fn mine(&self, height: u64, logs: impl IntoIterator<Item = LogEvent>) {
        self.chain.lock().unwrap().extend(logs);
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<(u64, u64)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogNode for ScriptedNode {
    async fn get_logs(&self, from: u64, to: u64) -> Result<Vec<LogEvent>, ScanError> {
        self.queries.lock().unwrap().push((from, to));
        if let Some(Reply::Fail(msg)) = self.script.lock().unwrap().pop_front() {
            return Err(ScanError::Rpc(msg.to_string()));
        }
        let tip = self.height.load(Ordering::SeqCst);
        Ok(self
            .chain
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.block_number >= from && l.block_number <= to.min(tip))
            .cloned()
            .collect())
    }

    async fn block_number(&self) -> Result<u64, ScanError> {
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn chain_id(&self) -> Result<u64, ScanError> {
        Ok(1)
    }

    fn url(&self) -> &str {
        &self.name
    }
}

pub fn log_at(block: u64, index: u32, topic: &str) -> LogEvent {
    let mut log = LogEvent::new(USDC, vec![topic.to_string()], block, vec![0u8; 32]);
    log.log_index = Some(index);
    log
}

pub fn as_endpoints(nodes: &[Arc<ScriptedNode>]) -> Vec<Arc<dyn LogNode>> {
    nodes.iter().map(|n| n.clone() as Arc<dyn LogNode>).collect()
}
