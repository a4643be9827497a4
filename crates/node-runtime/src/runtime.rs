//! # Node Runtime
//!
//! Owns the service container and the background tasks of a running node.
//!
//! ## Startup Sequence
//!
//! 1. Build the service container (backend, services, transport, bridge)
//! 2. Start the diagnostics task
//! 3. Serve until shutdown is signalled

use crate::container::{ContainerError, NodeConfig, ServiceContainer};
use shared_types::BlockNumber;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// How often the diagnostics task reports.
pub const DIAGNOSTICS_INTERVAL: Duration = Duration::from_secs(30);

/// Point-in-time view of the node's adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub last_committed: Option<BlockNumber>,
    pub staged_blocks: usize,
    pub pending_calls: usize,
    pub calls_resolved: u64,
}

/// The main node runtime.
pub struct NodeRuntime {
    container: Arc<ServiceContainer>,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig, runtime: Handle) -> Result<Self, ContainerError> {
        info!("Creating node runtime");
        let container = Arc::new(ServiceContainer::new(config, runtime)?);
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
        })
    }

    /// Start background tasks.
    pub fn start(&self) -> JoinHandle<()> {
        info!(
            storage = ?self.container.config.storage.backend,
            data_dir = %self.container.config.storage.data_dir.display(),
            "Node runtime started"
        );

        let container = Arc::clone(&self.container);
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(DIAGNOSTICS_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => log_status(&status_of(&container)),
                    _ = shutdown.changed() => {
                        info!("Diagnostics task stopping");
                        break;
                    }
                }
            }
        })
    }

    pub fn status(&self) -> NodeStatus {
        status_of(&self.container)
    }

    /// Signal every background task to stop.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown");
        self.shutdown_tx.send_replace(true);
        log_status(&self.status());
    }

    pub fn container(&self) -> Arc<ServiceContainer> {
        Arc::clone(&self.container)
    }
}

fn status_of(container: &ServiceContainer) -> NodeStatus {
    use qc_02_storage_service::StorageServiceApi;

    NodeStatus {
        last_committed: container.storage.last_committed(),
        staged_blocks: container.storage.state_cache().len(),
        pending_calls: container.bridge.registry().pending_count(),
        calls_resolved: container.bridge_stats().resolved(),
    }
}

fn log_status(status: &NodeStatus) {
    info!(
        last_committed = ?status.last_committed,
        staged_blocks = status.staged_blocks,
        pending_calls = status.pending_calls,
        calls_resolved = status.calls_resolved,
        "Node status"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let runtime = NodeRuntime::new(NodeConfig::default(), Handle::current()).unwrap();
        let task = runtime.start();

        assert_eq!(
            runtime.status(),
            NodeStatus {
                last_committed: None,
                staged_blocks: 0,
                pending_calls: 0,
                calls_resolved: 0,
            }
        );

        runtime.shutdown();
        task.await.unwrap();
    }
}
