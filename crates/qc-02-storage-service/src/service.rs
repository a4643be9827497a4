//! # Storage Service
//!
//! The main service implementing [`StorageServiceApi`].
//!
//! ## Architecture
//!
//! This service:
//! 1. Stages per-block mutations in the [`StateCacheStore`]
//! 2. Commits a block as one atomic key-value batch
//! 3. Serves reads from committed state only
//! 4. Uses dependency injection for the key-value store
//!
//! ## Locking
//!
//! Commits and raw writes take the global commit lock, then (for commits)
//! the stage slot of their block number. Staging takes only the slot.

use crate::adapters::InMemoryKVStore;
use crate::domain::commit::{decode_block_number, CommitPlan};
use crate::domain::errors::StorageError;
use crate::domain::schema::{Registration, SchemaRegistry};
use crate::domain::state_cache::StateCacheStore;
use crate::domain::value_objects::{KeyPrefix, StorageConfig};
use crate::ports::inbound::StorageServiceApi;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::{Mutex, RwLock};
use shared_types::{BlockNumber, Condition, Entry, TableInfo, TableMutationSet};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// The Storage Service.
pub struct StorageService<KV: KeyValueStore> {
    /// Key-value store for persistence.
    kv_store: KV,
    /// Registered table descriptors.
    schemas: SchemaRegistry,
    /// Staged, not-yet-committed blocks.
    state_cache: StateCacheStore,
    /// Serializes commits and raw writes.
    commit_lock: Mutex<()>,
    /// Canonical head.
    last_committed: RwLock<Option<BlockNumber>>,
}

impl<KV: KeyValueStore> StorageService<KV> {
    /// Open the service over `kv_store`, recovering registered tables and the
    /// last committed block number.
    pub fn open(kv_store: KV, config: StorageConfig) -> Result<Self, StorageError> {
        let schemas = SchemaRegistry::new();
        for (_, bytes) in kv_store.prefix_scan(KeyPrefix::Schema.as_bytes())? {
            let info: TableInfo = bincode::deserialize(&bytes)?;
            schemas.register(info)?;
        }

        let last_committed = kv_store
            .get(&KeyPrefix::last_committed_key())?
            .map(|bytes| decode_block_number(&bytes))
            .transpose()?;

        info!(
            tables = schemas.len(),
            last_committed = ?last_committed,
            max_staged_blocks = config.max_staged_blocks,
            "Storage service opened"
        );

        Ok(Self::with_store(kv_store, schemas, last_committed, &config))
    }

    fn with_store(
        kv_store: KV,
        schemas: SchemaRegistry,
        last_committed: Option<BlockNumber>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            kv_store,
            schemas,
            state_cache: StateCacheStore::new(config.max_staged_blocks),
            commit_lock: Mutex::new(()),
            last_committed: RwLock::new(last_committed),
        }
    }

    pub fn state_cache(&self) -> &StateCacheStore {
        &self.state_cache
    }

    pub fn kv_store(&self) -> &KV {
        &self.kv_store
    }

    /// Registered table names, sorted.
    pub fn tables(&self) -> Vec<String> {
        self.schemas.table_names()
    }

    fn read_row(&self, table: &str, key: &str) -> Result<Option<Entry>, StorageError> {
        self.kv_store
            .get(&KeyPrefix::row_key(table, key))?
            .map(|bytes| bincode::deserialize(&bytes).map_err(StorageError::from))
            .transpose()
    }

    /// Commit `sets` for `block_number`. Caller holds the commit lock.
    fn apply_commit(
        &self,
        block_number: BlockNumber,
        sets: &[(TableInfo, BTreeMap<String, Entry>)],
    ) -> Result<u64, StorageError> {
        self.schemas
            .validate_block(sets.iter().map(|(info, rows)| (info, rows)))?;

        let plan = CommitPlan::build(block_number, sets.iter().map(|(info, rows)| (info, rows)))?;
        let rows_applied = plan.rows_applied;

        if let Err(e) = self.kv_store.atomic_batch_write(plan.operations) {
            error!(block_number = block_number, error = %e, "Commit batch failed, rolled back");
            return Err(e.into());
        }

        *self.last_committed.write() = Some(block_number);
        Ok(rows_applied)
    }
}

impl StorageService<InMemoryKVStore> {
    /// Service over a fresh in-memory store.
    pub fn new_in_memory(config: StorageConfig) -> Self {
        Self::with_store(InMemoryKVStore::new(), SchemaRegistry::new(), None, &config)
    }
}

impl<KV: KeyValueStore> StorageServiceApi for StorageService<KV> {
    fn add_state_cache(
        &self,
        block_number: BlockNumber,
        mutations: Vec<TableMutationSet>,
    ) -> Result<(), StorageError> {
        let sets = mutations.iter().map(|set| (&set.table_info, &set.rows));
        if let Err(e) = self.schemas.validate_block(sets) {
            warn!(block_number = block_number, error = %e, "Rejected state cache");
            return Err(e);
        }

        // Entries at or below the head can never commit; free their slots
        // before refusing a new one.
        if self.state_cache.len() >= self.state_cache.capacity() {
            if let Some(head) = *self.last_committed.read() {
                self.state_cache.evict_through(head);
            }
        }
        self.state_cache.stage(block_number, mutations)
    }

    fn drop_state_cache(&self, block_number: BlockNumber) {
        let existed = self.state_cache.drop_entry(block_number);
        debug!(block_number = block_number, existed = existed, "Dropped state cache");
    }

    fn get_state_cache(&self, block_number: BlockNumber) -> Result<Vec<TableMutationSet>, StorageError> {
        self.state_cache.get(block_number)
    }

    fn commit_block(
        &self,
        block_number: BlockNumber,
        table_infos: Vec<TableInfo>,
        datas: Vec<BTreeMap<String, Entry>>,
    ) -> Result<u64, StorageError> {
        let _commit = self.commit_lock.lock();

        if let Some(last_committed) = *self.last_committed.read() {
            if block_number <= last_committed {
                warn!(
                    block_number = block_number,
                    last_committed = last_committed,
                    "Rejected stale commit"
                );
                return Err(StorageError::StaleCommit {
                    requested: block_number,
                    last_committed,
                });
            }
        }

        let use_staged = table_infos.is_empty() && datas.is_empty();
        if !use_staged && table_infos.len() != datas.len() {
            return Err(StorageError::CommitShapeMismatch {
                table_infos: table_infos.len(),
                datas: datas.len(),
            });
        }

        let count = self.state_cache.consume_with(block_number, |staged| {
            let sets: Vec<(TableInfo, BTreeMap<String, Entry>)> = if use_staged {
                let entry = staged.ok_or(StorageError::StateCacheNotFound { block_number })?;
                entry
                    .mutations
                    .iter()
                    .map(|set| (set.table_info.clone(), set.rows.clone()))
                    .collect()
            } else {
                table_infos.into_iter().zip(datas).collect()
            };
            self.apply_commit(block_number, &sets)
        })?;
        self.state_cache.evict_through(block_number);

        info!(
            block_number = block_number,
            rows = count,
            from_stage = use_staged,
            "Committed block"
        );
        Ok(count)
    }

    fn last_committed(&self) -> Option<BlockNumber> {
        *self.last_committed.read()
    }

    fn get(&self, table: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let info = self.schemas.resolve(table)?;
        let value = self
            .read_row(table, key)?
            .and_then(|row| value_of(&info, &row));
        Ok(value.unwrap_or_default())
    }

    fn get_batch(&self, table: &str, keys: &[String]) -> Result<Vec<Vec<u8>>, StorageError> {
        let info = self.schemas.resolve(table)?;
        let row_keys: Vec<Vec<u8>> = keys.iter().map(|k| KeyPrefix::row_key(table, k)).collect();

        self.kv_store
            .multi_get(&row_keys)?
            .into_iter()
            .map(|found| match found {
                Some(bytes) => {
                    let row: Entry = bincode::deserialize(&bytes)?;
                    Ok(value_of(&info, &row).unwrap_or_default())
                }
                None => Ok(Vec::new()),
            })
            .collect()
    }

    fn get_row(&self, table_info: &TableInfo, key: &str) -> Result<Entry, StorageError> {
        self.schemas.resolve_descriptor(table_info)?;
        self.read_row(&table_info.name, key)?
            .ok_or_else(|| StorageError::RowNotFound {
                table: table_info.name.clone(),
                key: key.to_string(),
            })
    }

    fn get_rows(
        &self,
        table_info: &TableInfo,
        keys: &[String],
    ) -> Result<BTreeMap<String, Entry>, StorageError> {
        self.schemas.resolve_descriptor(table_info)?;
        let row_keys: Vec<Vec<u8>> = keys
            .iter()
            .map(|k| KeyPrefix::row_key(&table_info.name, k))
            .collect();

        let mut rows = BTreeMap::new();
        for (key, found) in keys.iter().zip(self.kv_store.multi_get(&row_keys)?) {
            if let Some(bytes) = found {
                rows.insert(key.clone(), bincode::deserialize(&bytes)?);
            }
        }
        Ok(rows)
    }

    fn get_primary_keys(
        &self,
        table_info: &TableInfo,
        condition: &Condition,
    ) -> Result<Vec<String>, StorageError> {
        self.schemas.resolve_descriptor(table_info)?;
        let prefix = KeyPrefix::table_rows_prefix(&table_info.name);

        let mut keys: Vec<String> = self
            .kv_store
            .prefix_scan(&prefix)?
            .into_iter()
            .filter_map(|(row_key, _)| KeyPrefix::primary_key_of(&table_info.name, &row_key))
            .collect();
        keys.sort();
        Ok(condition.apply(keys))
    }

    fn put(&self, table: &str, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let _commit = self.commit_lock.lock();
        let info = self.schemas.resolve(table)?;
        let column = info
            .value_column()
            .ok_or_else(|| StorageError::NoValueColumn {
                table: table.to_string(),
            })?
            .to_string();

        let row = match self.read_row(table, key)? {
            Some(mut previous) => {
                previous.version += 1;
                previous.set_field(column, value);
                previous
            }
            None => Entry::new(0).with_field(column, value),
        };

        self.kv_store.atomic_batch_write(vec![BatchOperation::put(
            KeyPrefix::row_key(table, key),
            bincode::serialize(&row)?,
        )])?;
        debug!(table = table, key = key, version = row.version, "Put row");
        Ok(())
    }

    fn remove(&self, table: &str, key: &str) -> Result<(), StorageError> {
        let _commit = self.commit_lock.lock();
        self.schemas.resolve(table)?;
        self.kv_store
            .atomic_batch_write(vec![BatchOperation::delete(KeyPrefix::row_key(table, key))])?;
        debug!(table = table, key = key, "Removed row");
        Ok(())
    }

    fn create_table(&self, table_info: TableInfo) -> Result<(), StorageError> {
        let _commit = self.commit_lock.lock();
        if self.schemas.check(&table_info)? == Registration::AlreadyExists {
            return Ok(());
        }

        self.kv_store.atomic_batch_write(vec![BatchOperation::put(
            KeyPrefix::schema_key(&table_info.name),
            bincode::serialize(&table_info)?,
        )])?;
        info!(table = %table_info.name, fields = table_info.fields.len(), "Created table");
        self.schemas.register(table_info)?;
        Ok(())
    }

    fn table_info(&self, name: &str) -> Option<TableInfo> {
        self.schemas.get(name)
    }
}

/// First declared value column of a live row.
fn value_of(info: &TableInfo, row: &Entry) -> Option<Vec<u8>> {
    let column = info.value_column()?;
    row.get_field(column).map(<[u8]>::to_vec)
}
