//! chainscan-core — multi-endpoint log scanning engine.
//!
//! # Architecture
//!
//! ```text
//! ScanDriver (loop, error backoff, interval, cancellation)
//!     └── ScanEngine (one pass)
//!             ├── EndpointRotator → EndpointHealth (cooldowns)
//!             ├── ScanCursor      (next block, last forward progress)
//!             └── LogWatcher      (endpoints, interest predicate, callback)
//!                     └── LogNode (get_logs / block_number per endpoint)
//! ```
//!
//! Each engine owns its cursor and health map. Run several watchers
//! concurrently by giving each its own engine and driver.

pub mod builder;
pub mod clock;
pub mod config;
pub mod cursor;
pub mod driver;
pub mod engine;
pub mod error;
pub mod health;
pub mod node;
pub mod rotator;
pub mod types;
pub mod watcher;

pub use builder::ScannerBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DriverConfig, EngineConfig, LogConfig, ScannerConfig};
pub use cursor::ScanCursor;
pub use driver::{ErrorBreaker, ScanDriver, StepReport};
pub use engine::{PassOutcome, PassStop, ScanEngine};
pub use error::ScanError;
pub use health::EndpointHealth;
pub use node::LogNode;
pub use rotator::EndpointRotator;
pub use types::LogEvent;
pub use watcher::{InterestSet, LogWatcher, SimpleLogWatcher};
