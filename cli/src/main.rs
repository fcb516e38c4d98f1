//! chainscan CLI — follow contract logs across redundant RPC endpoints.
//!
//! Usage:
//! ```bash
//! # Follow USDC transfers from a config file
//! chainscan watch --config scanner.json
//!
//! # Same, from flags, with two failover endpoints
//! chainscan watch --url https://eth.llamarpc.com --url https://cloudflare-eth.com \
//!     --from 19000000 --address 0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48
//!
//! # Chain id and height of an endpoint
//! chainscan head --url https://cloudflare-eth.com
//! ```

use std::collections::HashMap;
use std::env;
use std::io::Write;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainscan_core::{LogConfig, LogNode, ScannerBuilder, ScannerConfig};
use chainscan_evm::{http_watcher, log_to_json, node_config, HttpLogNode};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "watch" => cmd_watch(&args[2..]).await,
        "head" => cmd_head(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("chainscan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainscan {}", env!("CARGO_PKG_VERSION"));
    println!("Follow contract logs across redundant RPC endpoints\n");
    println!("USAGE:");
    println!("    chainscan <COMMAND>\n");
    println!("COMMANDS:");
    println!("    watch      Scan logs and print matches as JSON lines");
    println!("    head       Print chain id and block height of an endpoint");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("WATCH FLAGS:");
    println!("    --config <FILE>     JSON scanner config (other flags override it)");
    println!("    --url <URL>         RPC endpoint URL, repeatable  [required without --config]");
    println!("    --from <BLOCK>      First block to scan");
    println!("    --batch <N>         Blocks per query  [default: 100]");
    println!("    --address <ADDR>    Contract address of interest, repeatable");
    println!("    --topic <HASH>      Event signature (topic0) of interest, repeatable");
    println!("    --json              Emit JSON logs on stderr\n");
    println!("HEAD FLAGS:");
    println!("    --url <URL>         RPC endpoint URL  [required]");
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn cmd_watch(args: &[String]) -> anyhow::Result<()> {
    let config = watch_config(args)?;
    init_tracing(&config.log);

    let watcher = http_watcher(&config, |log| {
        let line = log_to_json(log).to_string();
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").map_err(|e| chainscan_core::ScanError::handler(log.block_number, e))
    })?;

    let mut driver = ScannerBuilder::from_config(&config).build(Arc::new(watcher));
    let token = driver.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            token.cancel();
        }
    });

    driver.run().await;
    eprintln!("stopped; next block {}", driver.next_start());
    Ok(())
}

async fn cmd_head(args: &[String]) -> anyhow::Result<()> {
    let url = parse_flag(args, "--url").ok_or_else(|| anyhow!("--url is required"))?;
    let node = HttpLogNode::new(&url, node_config(&ScannerConfig::default()))?;

    let chain_id = node.chain_id().await.context("eth_chainId")?;
    let height = node.block_number().await.context("eth_blockNumber")?;

    println!("  Endpoint:     {url}");
    println!("  Chain id:     {chain_id}");
    println!("  Block number: {height}");
    Ok(())
}

// ─── Config & flags ───────────────────────────────────────────────────────────

/// Merge `--config` (if any) with command-line flags.
fn watch_config(args: &[String]) -> anyhow::Result<ScannerConfig> {
    let mut config = match parse_flag(args, "--config") {
        Some(path) => ScannerConfig::from_json_file(&path)?,
        None => ScannerConfig::default(),
    };

    let urls = parse_all(args, "--url");
    if !urls.is_empty() {
        config.endpoints = urls;
    }
    if let Some(from) = parse_flag(args, "--from") {
        config.start_block = from
            .parse()
            .with_context(|| format!("--from: invalid block number {from:?}"))?;
    }
    if let Some(batch) = parse_flag(args, "--batch") {
        config.per_scan_block_count = batch
            .parse()
            .with_context(|| format!("--batch: invalid count {batch:?}"))?;
    }
    config.addresses.extend(parse_all(args, "--address"));
    config.topics.extend(parse_all(args, "--topic"));
    if args.iter().any(|a| a == "--json") {
        config.log.json = true;
    }

    if config.endpoints.is_empty() {
        bail!("--url or a config file with endpoints is required");
    }
    config.validate()?;
    Ok(config)
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

/// Every value given for a repeatable flag.
fn parse_all(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Initialise tracing on stderr; stdout carries the log stream.
fn init_tracing(config: &LogConfig) {
    let mut directives = config.level.clone();
    for (component, level) in sorted(&config.components) {
        directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn sorted(components: &HashMap<String, String>) -> Vec<(&String, &String)> {
    let mut pairs: Vec<_> = components.iter().collect();
    pairs.sort();
    pairs
}
