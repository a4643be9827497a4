//! # Service Container
//!
//! Builds every service adapter, registers the server endpoints with the
//! in-process transport, and hands out bridge clients for them.
//!
//! ## Initialization Order
//!
//! 1. Key-value backend (locking the data directory for `file` and `rocksdb`)
//! 2. Storage service, then the tables listed in configuration
//! 3. Consensus and sync engines
//! 4. Transport with every endpoint registered
//! 5. Completion bridge, then the tx pool (which reports to consensus
//!    through it), then the clients

use super::config::{NodeConfig, StorageBackend};
use qc_02_storage_service::{
    DatabaseLock, FileBackedKVStore, InMemoryKVStore, KVStoreError, KeyValueStore, LockError,
    StorageError, StorageService, StorageServiceApi, StorageServiceClient, StorageServiceServer,
};
use qc_06_txpool_service::{StandaloneTxPool, TxPoolServiceClient, TxPoolServiceServer};
use qc_08_consensus_service::{
    BlockSyncServiceClient, BlockSyncServiceServer, PbftServiceClient, PbftServiceServer,
    StandaloneConsensusEngine, StandaloneSyncEngine,
};
use shared_bridge::{BridgeStatsSnapshot, CompletionBridge, InMemoryTransport};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::info;

/// Storage service over whichever backend was configured.
pub type NodeStorage = StorageService<Arc<dyn KeyValueStore>>;

/// Startup failures.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("failed to lock data directory: {0}")]
    Lock(#[from] LockError),

    #[error("failed to open storage: {0}")]
    Backend(#[from] KVStoreError),

    #[error("storage service error: {0}")]
    Storage(#[from] StorageError),
}

/// Every service adapter of the node.
pub struct ServiceContainer {
    pub config: NodeConfig,
    pub storage: Arc<NodeStorage>,
    pub consensus: Arc<StandaloneConsensusEngine>,
    pub txpool: Arc<StandaloneTxPool>,
    pub transport: Arc<InMemoryTransport>,
    pub bridge: CompletionBridge,
    pub storage_client: StorageServiceClient,
    pub pbft_client: PbftServiceClient,
    pub sync_client: BlockSyncServiceClient,
    pub txpool_client: TxPoolServiceClient,
    /// Held for the container's lifetime when a durable backend is used.
    _data_lock: Option<DatabaseLock>,
}

impl ServiceContainer {
    /// Build the container. Bridge tasks are spawned on `runtime`.
    pub fn new(config: NodeConfig, runtime: Handle) -> Result<Self, ContainerError> {
        let (store, data_lock): (Arc<dyn KeyValueStore>, _) = match config.storage.backend {
            StorageBackend::Memory => (Arc::new(InMemoryKVStore::new()), None),
            StorageBackend::File => {
                let lock = DatabaseLock::acquire(&config.storage.data_dir)?;
                let store = FileBackedKVStore::open(config.storage.data_file())?;
                (Arc::new(store), Some(lock))
            }
            #[cfg(feature = "rocksdb")]
            StorageBackend::RocksDb => {
                let lock = DatabaseLock::acquire(&config.storage.data_dir)?;
                let store = qc_02_storage_service::RocksDbKVStore::open(
                    config.storage.rocksdb_dir(),
                    qc_02_storage_service::RocksDbConfig::default(),
                )?;
                (Arc::new(store), Some(lock))
            }
        };

        let storage = Arc::new(StorageService::open(store, config.storage.service_config())?);
        for table in &config.storage.tables {
            storage.create_table(table.clone())?;
        }

        let consensus = Arc::new(StandaloneConsensusEngine::new());
        let sync = Arc::new(StandaloneSyncEngine::new(Arc::clone(&consensus)));

        let transport = Arc::new(InMemoryTransport::with_call_timeout(config.bridge.call_timeout()));
        transport.register(Arc::new(StorageServiceServer::new(Arc::clone(&storage))));
        transport.register(Arc::new(PbftServiceServer::new(Arc::clone(&consensus))));
        transport.register(Arc::new(BlockSyncServiceServer::new(sync)));

        let bridge = CompletionBridge::new(transport.clone(), runtime);
        let pbft_client = PbftServiceClient::new(bridge.clone());

        let txpool = Arc::new(
            StandaloneTxPool::new(config.txpool.capacity).with_consensus(pbft_client.clone()),
        );
        transport.register(Arc::new(TxPoolServiceServer::new(Arc::clone(&txpool))));

        info!(
            backend = ?config.storage.backend,
            tables = storage.tables().len(),
            last_committed = ?storage.last_committed(),
            txpool_capacity = config.txpool.capacity,
            call_timeout_ms = config.bridge.call_timeout_ms,
            "Service container ready"
        );

        Ok(Self {
            storage_client: StorageServiceClient::new(bridge.clone()),
            sync_client: BlockSyncServiceClient::new(bridge.clone()),
            txpool_client: TxPoolServiceClient::new(bridge.clone()),
            pbft_client,
            config,
            storage,
            consensus,
            txpool,
            transport,
            bridge,
            _data_lock: data_lock,
        })
    }

    /// Outbound call counters.
    pub fn bridge_stats(&self) -> BridgeStatsSnapshot {
        self.bridge.registry().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::config::StorageConfig;
    use shared_types::TableInfo;
    use tokio::sync::oneshot;

    fn memory_config() -> NodeConfig {
        NodeConfig {
            storage: StorageConfig {
                tables: vec![TableInfo::new("t_test", "id", vec!["value".into()])],
                ..StorageConfig::default()
            },
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_configured_tables_registered() {
        let container = ServiceContainer::new(memory_config(), Handle::current()).unwrap();
        assert_eq!(container.storage.tables(), vec!["t_test"]);
        assert!(container.transport.is_registered("StorageService"));
        assert!(container.transport.is_registered("PBFTService"));
        assert!(container.transport.is_registered("BlockSyncService"));
        assert!(container.transport.is_registered("TxPoolService"));
    }

    #[tokio::test]
    async fn test_clients_reach_services() {
        let container = ServiceContainer::new(memory_config(), Handle::current()).unwrap();

        let (tx, rx) = oneshot::channel();
        container.storage_client.put("t_test", "k", b"v".to_vec(), move |e| {
            let _ = tx.send(e);
        });
        assert!(rx.await.unwrap().is_none());
        assert_eq!(container.storage.get("t_test", "k").unwrap(), b"v".to_vec());

        let (tx, rx) = oneshot::channel();
        container.pbft_client.get_pbft_view(move |e, view| {
            let _ = tx.send((e, view));
        });
        assert_eq!(rx.await.unwrap(), (None, 0));
        assert_eq!(container.bridge_stats().completed, 2);
    }

    #[tokio::test]
    async fn test_txpool_client_reaches_pool() {
        let container = ServiceContainer::new(memory_config(), Handle::current()).unwrap();

        let (tx, rx) = oneshot::channel();
        container.txpool_client.submit(b"transfer".to_vec(), move |e, result| {
            let _ = tx.send((e, result));
        });
        let (error, result) = rx.await.unwrap();
        assert!(error.is_none());
        assert!(container.txpool.contains(&result.unwrap().tx_hash));
    }

    #[tokio::test]
    async fn test_file_backend_locks_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = memory_config();
        config.storage.backend = StorageBackend::File;
        config.storage.data_dir = dir.path().to_path_buf();

        let first = ServiceContainer::new(config.clone(), Handle::current()).unwrap();
        assert!(matches!(
            ServiceContainer::new(config.clone(), Handle::current()),
            Err(ContainerError::Lock(_))
        ));

        drop(first);
        ServiceContainer::new(config, Handle::current()).unwrap();
    }

    #[cfg(feature = "rocksdb")]
    #[tokio::test]
    async fn test_rocksdb_backend_recovers_head() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = memory_config();
        config.storage.backend = StorageBackend::RocksDb;
        config.storage.data_dir = dir.path().to_path_buf();

        {
            let container = ServiceContainer::new(config.clone(), Handle::current()).unwrap();
            let table = container.storage.table_info("t_test").unwrap();
            let rows = vec![shared_types::TableMutationSet::new(table)
                .with_row("k", shared_types::Entry::new(0).with_field("value", b"v".to_vec()))];
            container.storage.add_state_cache(3, rows).unwrap();
            container.storage.commit_block(3, vec![], vec![]).unwrap();
        }

        let container = ServiceContainer::new(config, Handle::current()).unwrap();
        assert_eq!(container.storage.last_committed(), Some(3));
        assert_eq!(container.storage.get("t_test", "k").unwrap(), b"v".to_vec());
    }
}
