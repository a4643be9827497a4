//! # RocksDB Storage Adapter
//!
//! Durable [`KeyValueStore`] for production nodes. A commit batch maps onto
//! one RocksDB `WriteBatch`, which the engine applies atomically, so a
//! failed write leaves nothing behind.
//!
//! Keys keep the flat `KeyPrefix` layout in the default column family; the
//! table prefix already isolates tables.

use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use rocksdb::{BlockBasedOptions, Cache, DBCompressionType, Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// RocksDB tuning.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// fsync every batch (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing() -> Self {
        Self {
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store.
pub struct RocksDbKVStore {
    db: DB,
    path: PathBuf,
    sync_writes: bool,
}

impl RocksDbKVStore {
    /// Open or create the database directory at `path`.
    pub fn open<P: AsRef<Path>>(path: P, config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &path).map_err(|e| KVStoreError::IOError {
            message: format!("Failed to open RocksDB at {}: {}", path.display(), e),
        })?;
        info!(path = %path.display(), sync_writes = config.sync_writes, "Opened RocksDB store");

        Ok(Self {
            db,
            path,
            sync_writes: config.sync_writes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }
}

fn io_error(operation: &str, e: rocksdb::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: format!("RocksDB {} failed: {}", operation, e),
    }
}

impl KeyValueStore for RocksDbKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| io_error("get", e))
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, KVStoreError> {
        self.db
            .multi_get(keys)
            .into_iter()
            .map(|found| found.map_err(|e| io_error("multi_get", e)))
            .collect()
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let count = operations.len();
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }

        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| io_error("batch write", e))?;
        debug!(operations = count, "Applied RocksDB batch");
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.db
            .get_pinned(key)
            .map(|found| found.is_some())
            .map_err(|e| io_error("exists", e))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let mut results = Vec::new();
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(|e| io_error("scan", e))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}
