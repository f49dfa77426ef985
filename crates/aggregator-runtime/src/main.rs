//! # Task Consensus Aggregator
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `TC_CONFIG_FILE`, environment)
//! 2. Initialize logging
//! 3. Open the state store
//! 4. Build the aggregator and its per-chain block context managers
//! 5. Recover tasks left over from the previous run
//! 6. Consume chain events until Ctrl+C
//!
//! The binary ships the loopback operator network in place of a peering and
//! transport layer; the chain poller feeding `ChainEvent`s is external.

use std::sync::Arc;

use anyhow::{Context, Result};
use aggregator_runtime::adapters::{LogSink, LoopbackNetwork};
use aggregator_runtime::{init_logging, Aggregator, AggregatorConfig, AvsConfig};
use tc_01_state_store::open_state_store;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = AggregatorConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging).context("Failed to initialize logging")?;

    if config.avs.is_empty() {
        warn!("No AVS configured, serving the development AVS");
        config.avs.push(AvsConfig::development());
    }
    config.validate().context("Invalid configuration")?;

    info!("===========================================");
    info!("  Task Consensus Aggregator v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let store_config = config.store_config()?;
    let store = open_state_store(&store_config).context("Failed to open state store")?;
    info!("Storage: {:?} at {:?}", store_config.backend, store_config.rocksdb.path);

    let network = Arc::new(
        LoopbackNetwork::new(&config.avs, &config.loopback)
            .context("Failed to seed loopback operators")?,
    );
    let aggregator = Arc::new(
        Aggregator::new(&config, store, network.clone(), network, Arc::new(LogSink))
            .context("Failed to build aggregator")?,
    );

    // the chain poller holds the sender
    let (_events_tx, events_rx) = mpsc::channel(1024);
    let shutdown = CancellationToken::new();
    let runner = tokio::spawn(aggregator.run(events_rx, shutdown.clone()));

    info!("Aggregator is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Initiating graceful shutdown...");
    shutdown.cancel();

    runner
        .await
        .context("Aggregator task panicked")?
        .context("Aggregator stopped with an error")?;
    info!("Shutdown complete");
    Ok(())
}
