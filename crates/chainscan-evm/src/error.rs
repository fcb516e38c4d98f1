//! Transport-level error types.

use thiserror::Error;

use chainscan_core::ScanError;

use crate::request::JsonRpcError;

/// Errors raised while talking to a JSON-RPC node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Response was well-formed JSON but not a valid answer.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<TransportError> for ScanError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout { ms } => ScanError::Timeout { ms },
            other => ScanError::Rpc(other.to_string()),
        }
    }
}
