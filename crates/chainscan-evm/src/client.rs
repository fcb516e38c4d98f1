//! HTTP JSON-RPC log node backed by `reqwest`.
//!
//! One `HttpLogNode` per endpoint URL. Retries and failover are left to the
//! scan engine, which cools a failing node down and moves to the next one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use chainscan_core::{LogEvent, LogNode, ScanError};

use crate::error::TransportError;
use crate::log::{decode_logs, parse_quantity, LogFilter};
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Configuration for [`HttpLogNode`].
#[derive(Debug, Clone)]
pub struct HttpNodeConfig {
    pub request_timeout: Duration,
    pub filter: LogFilter,
}

impl Default for HttpNodeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            filter: LogFilter::default(),
        }
    }
}

/// `LogNode` speaking JSON-RPC 2.0 over HTTP.
pub struct HttpLogNode {
    url: String,
    http: reqwest::Client,
    filter: LogFilter,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl HttpLogNode {
    /// Create a node for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpNodeConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            http,
            filter: config.filter,
            request_timeout: config.request_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(url, HttpNodeConfig::default())
    }

    /// Send one request and return its `result`.
    async fn call(&self, method: &'static str, params: Vec<Value>) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        let body = resp.bytes().await.map_err(|e| self.http_error(e))?;
        let resp: JsonRpcResponse = serde_json::from_slice(&body)?;
        resp.into_result().map_err(TransportError::Rpc)
    }

    fn http_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }

    async fn quantity(&self, method: &'static str) -> Result<u64, TransportError> {
        let value = self.call(method, vec![]).await?;
        let hex = value
            .as_str()
            .ok_or_else(|| TransportError::invalid(format!("{method} returned {value}")))?;
        parse_quantity(hex)
    }
}

#[async_trait]
impl LogNode for HttpLogNode {
    async fn get_logs(&self, from: u64, to: u64) -> Result<Vec<LogEvent>, ScanError> {
        let params = self.filter.to_params(from, to);
        let result = self.call("eth_getLogs", vec![params]).await?;
        Ok(decode_logs(result)?)
    }

    async fn block_number(&self) -> Result<u64, ScanError> {
        Ok(self.quantity("eth_blockNumber").await?)
    }

    async fn chain_id(&self) -> Result<u64, ScanError> {
        Ok(self.quantity("eth_chainId").await?)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Build one [`HttpLogNode`] per URL, all sharing `config`.
pub fn http_endpoints<S: AsRef<str>>(
    urls: &[S],
    config: &HttpNodeConfig,
) -> Result<Vec<Arc<dyn LogNode>>, TransportError> {
    urls.iter()
        .map(|url| -> Result<Arc<dyn LogNode>, TransportError> {
            let node = HttpLogNode::new(url.as_ref(), config.clone())?;
            Ok(Arc::new(node) as Arc<dyn LogNode>)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Consume one request (headers plus `content-length` body).
    async fn read_request(sock: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    /// Serve `bodies` in order, one HTTP response per connection.
    async fn serve(bodies: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for body in bodies {
                let (mut sock, _) = listener.accept().await.unwrap();
                read_request(&mut sock).await;
                let resp = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                sock.write_all(resp.as_bytes()).await.unwrap();
                sock.shutdown().await.unwrap();
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn block_number_and_chain_id() {
        let url = serve(vec![
            r#"{"jsonrpc":"2.0","id":1,"result":"0x1219e14"}"#,
            r#"{"jsonrpc":"2.0","id":2,"result":"0x89"}"#,
        ])
        .await;
        let node = HttpLogNode::default_for(url).unwrap();
        assert_eq!(node.block_number().await.unwrap(), 18_980_372);
        assert_eq!(node.chain_id().await.unwrap(), 137);
    }

    #[tokio::test]
    async fn get_logs_decodes_result() {
        let url = serve(vec![
            r#"{"jsonrpc":"2.0","id":1,"result":[{"address":"0xabc","topics":["0x01"],"data":"0x0a","blockNumber":"0x65","logIndex":"0x0","transactionHash":"0xff","blockHash":"0xee","removed":false}]}"#,
        ])
        .await;
        let node = HttpLogNode::default_for(url).unwrap();
        let logs = node.get_logs(100, 104).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_number, 101);
        assert_eq!(logs[0].data, vec![0x0a]);
    }

    #[tokio::test]
    async fn rpc_error_is_an_endpoint_failure() {
        let url = serve(vec![
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit exceeded"}}"#,
        ])
        .await;
        let node = HttpLogNode::default_for(url).unwrap();
        let err = node.get_logs(0, 10_000).await.unwrap_err();
        assert!(err.is_endpoint_failure());
        assert!(err.to_string().contains("limit exceeded"));
    }

    #[tokio::test]
    async fn malformed_height_is_rejected() {
        let url = serve(vec![r#"{"jsonrpc":"2.0","id":1,"result":12}"#]).await;
        let node = HttpLogNode::default_for(url).unwrap();
        assert!(node.block_number().await.is_err());
    }

    #[test]
    fn builds_one_node_per_url() {
        let nodes = http_endpoints(&["http://a:8545", "http://b:8545"], &HttpNodeConfig::default())
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].url(), "http://b:8545");
    }
}
