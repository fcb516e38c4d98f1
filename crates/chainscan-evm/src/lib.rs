//! chainscan-evm — EVM JSON-RPC log nodes for the chainscan engine.
//!
//! [`HttpLogNode`] implements `LogNode` over HTTP (`eth_getLogs`,
//! `eth_blockNumber`, `eth_chainId`). [`http_watcher`] turns a
//! `ScannerConfig` into a ready-to-run `SimpleLogWatcher`.

pub mod client;
pub mod error;
pub mod log;
pub mod request;
pub mod watcher;

pub use client::{http_endpoints, HttpLogNode, HttpNodeConfig};
pub use error::TransportError;
pub use log::{log_to_json, LogFilter, RawLog};
pub use watcher::{http_watcher, node_config};
