//! `SimpleLogWatcher` wired to HTTP endpoints from a [`ScannerConfig`].

use std::time::Duration;

use chainscan_core::{InterestSet, LogEvent, ScanError, ScannerConfig, SimpleLogWatcher};

use crate::client::{http_endpoints, HttpNodeConfig};
use crate::error::TransportError;
use crate::log::LogFilter;

/// Node settings implied by a scanner config.
pub fn node_config(config: &ScannerConfig) -> HttpNodeConfig {
    let request_timeout = match config.request_timeout_ms {
        0 => HttpNodeConfig::default().request_timeout,
        ms => Duration::from_millis(ms),
    };
    HttpNodeConfig {
        request_timeout,
        filter: LogFilter::new(config.addresses.clone(), config.topics.clone()),
    }
}

/// Build a watcher over every configured endpoint, interested in the
/// configured addresses and topics.
pub fn http_watcher<F>(config: &ScannerConfig, callback: F) -> Result<SimpleLogWatcher, TransportError>
where
    F: Fn(&LogEvent) -> Result<(), ScanError> + Send + Sync + 'static,
{
    let endpoints = http_endpoints(&config.endpoints, &node_config(config))?;

    let mut interest = InterestSet::new();
    for address in &config.addresses {
        interest.add_address(address);
    }
    for topic in &config.topics {
        interest.add_topic(topic);
    }

    Ok(SimpleLogWatcher::new(endpoints, config.start_block, callback)
        .with_block_count(config.per_scan_block_count)
        .with_interval(config.scan_interval())
        .with_interest(interest))
}
