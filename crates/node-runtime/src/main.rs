//! # Ledger Node Runtime
//!
//! Entry point of the node's service adapters.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment (`QC_*`)
//! 2. Initialise logging
//! 3. Build the service container and start background tasks
//! 4. Run until Ctrl+C, then shut down

use anyhow::{Context, Result};
use node_runtime::{logging, NodeConfig, NodeRuntime};
use tokio::runtime::Handle;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Invalid configuration")?;
    logging::init(&config.logging).context("Failed to initialise logging")?;

    let runtime = NodeRuntime::new(config, Handle::current()).context("Failed to start services")?;
    let diagnostics = runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown();
    diagnostics.await.context("Diagnostics task failed")?;
    info!("Shutdown complete");

    Ok(())
}
