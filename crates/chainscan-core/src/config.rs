//! Scanner configuration.
//!
//! [`EngineConfig`] and [`DriverConfig`] carry the runtime tunables of a scan
//! engine and its driver loop. [`ScannerConfig`] is the serializable,
//! file-loadable form used by hosting processes.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::health::DEFAULT_COOLDOWN;

/// Default wait after which an empty result triggers a chain height check.
pub const DEFAULT_TIP_CHECK_AFTER: Duration = Duration::from_secs(10);
/// Consecutive errored passes before the driver backs off.
pub const DEFAULT_ERROR_THRESHOLD: u32 = 10;
/// Backoff applied once the error threshold is reached.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(30);
/// Intervals at or below this are treated as "no delay".
pub const POLL_TICK: Duration = Duration::from_millis(1);

// ─── Runtime configs ──────────────────────────────────────────────────────────

/// Tunables of a single scan engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long an endpoint is parked after a failed query.
    pub endpoint_cooldown: Duration,
    /// Minimum time since the last forward progress before an empty result
    /// is verified against the node's chain height.
    pub tip_check_after: Duration,
    /// Upper bound on a single node call; `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint_cooldown: DEFAULT_COOLDOWN,
            tip_check_after: DEFAULT_TIP_CHECK_AFTER,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Tunables of the driver loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Consecutive errored passes that trip the backoff.
    pub error_threshold: u32,
    /// Sleep applied when the threshold is reached.
    pub error_backoff: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

// ─── ScannerConfig ────────────────────────────────────────────────────────────

/// Log output settings for hosting processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-component overrides: component_name → level
    #[serde(default)]
    pub components: HashMap<String, String>,
    /// Emit JSON structured logs instead of human-readable text
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: HashMap::new(),
            json: false,
        }
    }
}

/// File-loadable scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// First block to scan.
    pub start_block: u64,
    /// Blocks per `get_logs` query.
    pub per_scan_block_count: u64,
    /// Delay between passes (milliseconds).
    pub scan_interval_ms: u64,
    /// Endpoint cooldown after a failed query (seconds).
    pub endpoint_cooldown_secs: u64,
    /// Tip-check gate (seconds).
    pub tip_check_after_secs: u64,
    /// Consecutive errored passes before backing off.
    pub error_threshold: u32,
    /// Backoff after the error threshold (seconds).
    pub error_backoff_secs: u64,
    /// Per-call timeout (milliseconds); 0 disables it.
    pub request_timeout_ms: u64,
    /// JSON-RPC endpoint URLs, in selection order.
    pub endpoints: Vec<String>,
    /// Contract addresses of interest.
    pub addresses: Vec<String>,
    /// Event signature hashes (`topics[0]`) of interest.
    pub topics: Vec<String>,
    pub log: LogConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            per_scan_block_count: 100,
            scan_interval_ms: 2000,
            endpoint_cooldown_secs: DEFAULT_COOLDOWN.as_secs(),
            tip_check_after_secs: DEFAULT_TIP_CHECK_AFTER.as_secs(),
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            error_backoff_secs: DEFAULT_ERROR_BACKOFF.as_secs(),
            request_timeout_ms: 30_000,
            endpoints: vec![],
            addresses: vec![],
            topics: vec![],
            log: LogConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScanError> {
        serde_json::from_str(raw).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Reject configurations the scanner cannot run with.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.per_scan_block_count == 0 {
            return Err(ScanError::Config("per_scan_block_count must be at least 1".into()));
        }
        if self.endpoints.is_empty() {
            return Err(ScanError::Config("at least one endpoint is required".into()));
        }
        if self.error_threshold == 0 {
            return Err(ScanError::Config("error_threshold must be at least 1".into()));
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            endpoint_cooldown: Duration::from_secs(self.endpoint_cooldown_secs),
            tip_check_after: Duration::from_secs(self.tip_check_after_secs),
            request_timeout: (self.request_timeout_ms > 0)
                .then(|| Duration::from_millis(self.request_timeout_ms)),
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            error_threshold: self.error_threshold,
            error_backoff: Duration::from_secs(self.error_backoff_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scanner_constants() {
        let cfg = ScannerConfig::default();
        let engine = cfg.engine_config();
        assert_eq!(engine.endpoint_cooldown, Duration::from_secs(10));
        assert_eq!(engine.tip_check_after, Duration::from_secs(10));
        let driver = cfg.driver_config();
        assert_eq!(driver.error_threshold, 10);
        assert_eq!(driver.error_backoff, Duration::from_secs(30));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ScannerConfig::from_json_str(
            r#"{ "start_block": 19000000, "endpoints": ["https://a", "https://b"],
                 "request_timeout_ms": 0, "log": { "json": true } }"#,
        )
        .unwrap();
        assert_eq!(cfg.start_block, 19_000_000);
        assert_eq!(cfg.per_scan_block_count, 100);
        assert_eq!(cfg.endpoints.len(), 2);
        assert!(cfg.log.json);
        assert_eq!(cfg.log.level, "info");
        assert!(cfg.engine_config().request_timeout.is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_batch_and_missing_endpoints() {
        let mut cfg = ScannerConfig::default();
        assert!(cfg.validate().is_err()); // no endpoints
        cfg.endpoints.push("https://a".into());
        cfg.per_scan_block_count = 0;
        assert!(matches!(cfg.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            ScannerConfig::from_json_str("{ not json"),
            Err(ScanError::Config(_))
        ));
    }
}
