//! `eth_getLogs` payloads: raw log decoding, filters and JSON output.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use chainscan_core::LogEvent;

use crate::error::TransportError;

/// A raw EVM log as returned by `eth_getLogs`.
///
/// Pending logs carry `null` positions, so everything but the address,
/// topics and data is optional here and checked in [`RawLog::into_event`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: Option<String>,
    #[serde(rename = "blockHash")]
    pub block_hash: Option<String>,
    #[serde(rename = "transactionHash")]
    pub tx_hash: Option<String>,
    #[serde(rename = "logIndex")]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RawLog {
    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }

    /// Convert into a [`LogEvent`], rejecting malformed fields.
    pub fn into_event(self) -> Result<LogEvent, TransportError> {
        let block = self
            .block_number
            .as_deref()
            .ok_or_else(|| TransportError::invalid("log without blockNumber"))?;
        let block = parse_quantity(block)?;
        let data = parse_data(&self.data)?;
        let log_index = self
            .log_index
            .as_deref()
            .map(|idx| -> Result<u32, TransportError> {
                let idx = parse_quantity(idx)?;
                u32::try_from(idx)
                    .map_err(|_| TransportError::invalid(format!("logIndex {idx} out of range")))
            })
            .transpose()?;

        let mut event = LogEvent::new(self.address, self.topics, block, data);
        event.tx_hash = self.tx_hash;
        event.block_hash = self.block_hash;
        event.log_index = log_index;
        Ok(event)
    }
}

/// Decode an `eth_getLogs` result, dropping logs removed by a reorg.
pub fn decode_logs(result: Value) -> Result<Vec<LogEvent>, TransportError> {
    let raw: Vec<RawLog> = serde_json::from_value(result)?;
    let total = raw.len();
    let events = raw
        .into_iter()
        .filter(|log| !log.is_removed())
        .map(RawLog::into_event)
        .collect::<Result<Vec<_>, _>>()?;
    if events.len() != total {
        tracing::debug!(removed = total - events.len(), "dropped removed logs");
    }
    Ok(events)
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(s: &str) -> Result<u64, TransportError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| TransportError::invalid(format!("quantity {s:?} lacks 0x prefix")))?;
    if digits.is_empty() {
        return Err(TransportError::invalid("empty quantity"));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| TransportError::invalid(format!("bad quantity {s:?}: {e}")))
}

/// Parse `0x`-prefixed hex data; `"0x"` and `""` are empty payloads.
pub fn parse_data(s: &str) -> Result<Vec<u8>, TransportError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| TransportError::invalid(format!("bad data payload: {e}")))
}

/// Format a block number as a JSON-RPC quantity.
pub fn quantity(n: u64) -> String {
    format!("{n:#x}")
}

/// Server-side filter sent with `eth_getLogs`.
///
/// Nodes AND the address and topic criteria, while interest matching is an
/// OR of the two. The filter is therefore only pushed down when exactly one
/// of the sets is non-empty; otherwise the full range is fetched and the
/// watcher filters locally.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub addresses: Vec<String>,
    pub topics: Vec<String>,
}

impl LogFilter {
    pub fn new(addresses: Vec<String>, topics: Vec<String>) -> Self {
        Self { addresses, topics }
    }

    /// Build the `eth_getLogs` filter object for `[from, to]`.
    pub fn to_params(&self, from: u64, to: u64) -> Value {
        let mut filter = json!({
            "fromBlock": quantity(from),
            "toBlock": quantity(to),
        });
        match (self.addresses.is_empty(), self.topics.is_empty()) {
            (false, true) => filter["address"] = json!(self.addresses),
            (true, false) => filter["topics"] = json!([self.topics]),
            _ => {}
        }
        filter
    }
}

/// Render a log as a single JSON object with hex-encoded data.
pub fn log_to_json(log: &LogEvent) -> Value {
    json!({
        "address": log.address,
        "topics": log.topics,
        "data": format!("0x{}", hex::encode(&log.data)),
        "blockNumber": log.block_number,
        "blockHash": log.block_hash,
        "transactionHash": log.tx_hash,
        "logIndex": log.log_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFER: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

    fn fixture() -> Value {
        json!([
            {
                "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                "topics": [TRANSFER],
                "data": "0x00000000000000000000000000000000000000000000000000000000000003e8",
                "blockNumber": "0x1219e14",
                "blockHash": "0x8243343df08b9751f5ca0c5f8c9c0460d8a9b6351066fae0acbd4d3e776de8bb",
                "transactionHash": "0x2e0d9fd4e3a4c4b2e7f0a1c8de7f7f0f15d1c8f4e1c0b0a9f8e7d6c5b4a39281",
                "logIndex": "0x1b",
                "removed": false
            },
            {
                "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                "topics": [TRANSFER],
                "data": "0x",
                "blockNumber": "0x1219e14",
                "blockHash": "0x8243343df08b9751f5ca0c5f8c9c0460d8a9b6351066fae0acbd4d3e776de8bb",
                "transactionHash": "0x11",
                "logIndex": "0x1c",
                "removed": true
            }
        ])
    }

    #[test]
    fn decodes_and_drops_removed() {
        let logs = decode_logs(fixture()).unwrap();
        assert_eq!(logs.len(), 1);
        let log = &logs[0];
        assert_eq!(log.block_number, 18_980_372);
        assert_eq!(log.log_index, Some(27));
        assert_eq!(log.primary_topic(), Some(TRANSFER));
        assert_eq!(log.data.len(), 32);
        assert_eq!(log.data[31], 0xe8);
    }

    #[test]
    fn pending_log_without_block_is_rejected() {
        let raw = json!([{ "address": "0x1", "topics": [], "data": "0x", "blockNumber": null }]);
        assert!(matches!(decode_logs(raw), Err(TransportError::InvalidResponse(_))));
    }

    #[test]
    fn quantities_are_strict() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x12a05f200").unwrap(), 5_000_000_000);
        assert!(parse_quantity("1234").is_err());
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn data_parsing() {
        assert!(parse_data("0x").unwrap().is_empty());
        assert_eq!(parse_data("0xdeadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(parse_data("0xabc").is_err());
    }

    #[test]
    fn filter_pushdown_only_for_a_single_criterion() {
        let open = LogFilter::default().to_params(100, 104);
        assert_eq!(open["fromBlock"], "0x64");
        assert_eq!(open["toBlock"], "0x68");
        assert!(open.get("address").is_none());
        assert!(open.get("topics").is_none());

        let by_address = LogFilter::new(vec!["0xabc".into()], vec![]).to_params(1, 1);
        assert_eq!(by_address["address"], json!(["0xabc"]));

        let by_topic = LogFilter::new(vec![], vec![TRANSFER.into()]).to_params(1, 1);
        assert_eq!(by_topic["topics"], json!([[TRANSFER]]));

        let both = LogFilter::new(vec!["0xabc".into()], vec![TRANSFER.into()]).to_params(1, 1);
        assert!(both.get("address").is_none());
        assert!(both.get("topics").is_none());
    }

    #[test]
    fn json_output_hex_encodes_data() {
        let mut log = LogEvent::new("0xabc", vec![TRANSFER.into()], 101, vec![1, 2]);
        log.log_index = Some(3);
        let v = log_to_json(&log);
        assert_eq!(v["data"], "0x0102");
        assert_eq!(v["blockNumber"], 101);
        assert_eq!(v["logIndex"], 3);
        assert!(v["transactionHash"].is_null());
    }
}
