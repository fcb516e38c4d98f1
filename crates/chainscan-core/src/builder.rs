//! Fluent builder for scan engines and drivers.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use chainscan_core::{ScannerBuilder, SimpleLogWatcher};
//!
//! let watcher = SimpleLogWatcher::new(vec![], 19_000_000, |log| {
//!     println!("{} @ {}", log.address, log.block_number);
//!     Ok(())
//! });
//! let driver = ScannerBuilder::new()
//!     .endpoint_cooldown(Duration::from_secs(15))
//!     .error_threshold(5)
//!     .build(Arc::new(watcher));
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::{DriverConfig, EngineConfig, ScannerConfig};
use crate::driver::ScanDriver;
use crate::engine::ScanEngine;
use crate::watcher::LogWatcher;

/// Fluent builder for [`ScanEngine`] / [`ScanDriver`].
pub struct ScannerBuilder {
    engine: EngineConfig,
    driver: DriverConfig,
    clock: Arc<dyn Clock>,
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
            driver: DriverConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Start from the tunables of a loaded [`ScannerConfig`].
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self {
            engine: config.engine_config(),
            driver: config.driver_config(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set how long a failing endpoint is parked.
    pub fn endpoint_cooldown(mut self, cooldown: Duration) -> Self {
        self.engine.endpoint_cooldown = cooldown;
        self
    }

    /// Set the wait before an empty result is checked against the chain height.
    pub fn tip_check_after(mut self, after: Duration) -> Self {
        self.engine.tip_check_after = after;
        self
    }

    /// Set the per-call timeout; `None` relies on the transport alone.
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.engine.request_timeout = timeout;
        self
    }

    /// Set the number of consecutive errored passes that trigger a backoff.
    pub fn error_threshold(mut self, threshold: u32) -> Self {
        self.driver.error_threshold = threshold;
        self
    }

    /// Set the backoff applied when the error threshold is reached.
    pub fn error_backoff(mut self, backoff: Duration) -> Self {
        self.driver.error_backoff = backoff;
        self
    }

    /// Use a custom time source (tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn driver_config(&self) -> &DriverConfig {
        &self.driver
    }

    /// Build a standalone engine (single passes, no loop).
    pub fn build_engine(&self, watcher: Arc<dyn LogWatcher>) -> ScanEngine {
        ScanEngine::with_clock(watcher, self.engine.clone(), self.clock.clone())
    }

    /// Build a driver around a fresh engine.
    pub fn build(self, watcher: Arc<dyn LogWatcher>) -> ScanDriver {
        let engine = self.build_engine(watcher);
        ScanDriver::new(engine, self.driver)
    }
}
