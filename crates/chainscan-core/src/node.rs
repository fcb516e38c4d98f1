//! Query surface of one blockchain node.

use async_trait::async_trait;

use crate::error::ScanError;
use crate::types::LogEvent;

/// One endpoint in the redundant node pool.
///
/// # Object Safety
/// The trait is object-safe and is handed to the engine as `Arc<dyn LogNode>`.
#[async_trait]
pub trait LogNode: Send + Sync {
    /// All logs in the inclusive block range `[from, to]`.
    ///
    /// An empty vector is ambiguous: the range may hold no logs, or the node
    /// may not have produced those blocks yet.
    async fn get_logs(&self, from: u64, to: u64) -> Result<Vec<LogEvent>, ScanError>;

    /// Current chain height as seen by this node.
    async fn block_number(&self) -> Result<u64, ScanError>;

    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ScanError> {
        Err(ScanError::Other(format!("chain id not supported by {}", self.url())))
    }

    /// Identifier used in log lines (URL or name).
    fn url(&self) -> &str;
}
