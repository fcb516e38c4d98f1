//! Error types for the scanning pipeline.

use thiserror::Error;

/// Errors that can occur while scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A node query failed (network, JSON-RPC or decoding error).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A node query did not complete within the per-call timeout.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The watcher could not hand out its endpoint connections.
    #[error("Endpoint acquisition failed: {0}")]
    Endpoints(String),

    /// The consumer callback rejected a log event.
    #[error("Handler error at block {block}: {reason}")]
    Handler { block: u64, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ScanError {
    /// Build a handler error from any displayable reason.
    pub fn handler(block: u64, reason: impl std::fmt::Display) -> Self {
        Self::Handler {
            block,
            reason: reason.to_string(),
        }
    }

    /// Returns `true` if the error is attributable to a single endpoint
    /// (the endpoint is cooled down and the pass continues elsewhere).
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Timeout { .. })
    }
}
