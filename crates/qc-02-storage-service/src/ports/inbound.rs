//! # Inbound Ports (Driving Ports)
//!
//! The API the Storage Service exposes to its server adapter.

use crate::domain::errors::StorageError;
use shared_types::{BlockNumber, Condition, Entry, TableInfo, TableMutationSet};
use std::collections::BTreeMap;

/// Staged-commit storage API.
///
/// Reads only ever observe committed state; staged mutations are invisible
/// until their block is committed.
pub trait StorageServiceApi: Send + Sync {
    // =========================================================================
    // STATE CACHE
    // =========================================================================

    /// Validate and stage mutations for `block_number`, replacing any prior
    /// entry. Never touches durable storage.
    fn add_state_cache(
        &self,
        block_number: BlockNumber,
        mutations: Vec<TableMutationSet>,
    ) -> Result<(), StorageError>;

    /// Discard the staged entry for `block_number`, if any.
    fn drop_state_cache(&self, block_number: BlockNumber);

    fn get_state_cache(&self, block_number: BlockNumber) -> Result<Vec<TableMutationSet>, StorageError>;

    // =========================================================================
    // COMMIT
    // =========================================================================

    /// Atomically apply a block's mutations and return the rows applied.
    ///
    /// With empty `table_infos` and `datas` the staged entry for
    /// `block_number` is committed instead.
    fn commit_block(
        &self,
        block_number: BlockNumber,
        table_infos: Vec<TableInfo>,
        datas: Vec<BTreeMap<String, Entry>>,
    ) -> Result<u64, StorageError>;

    /// Highest committed block number, if any block was committed.
    fn last_committed(&self) -> Option<BlockNumber>;

    // =========================================================================
    // READS
    // =========================================================================

    /// First value column of a committed row; empty when the row is absent.
    fn get(&self, table: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Positional batch read; absent keys yield empty values.
    fn get_batch(&self, table: &str, keys: &[String]) -> Result<Vec<Vec<u8>>, StorageError>;

    fn get_row(&self, table_info: &TableInfo, key: &str) -> Result<Entry, StorageError>;

    /// Present rows only.
    fn get_rows(
        &self,
        table_info: &TableInfo,
        keys: &[String],
    ) -> Result<BTreeMap<String, Entry>, StorageError>;

    /// Sorted live primary keys matching `condition`.
    fn get_primary_keys(
        &self,
        table_info: &TableInfo,
        condition: &Condition,
    ) -> Result<Vec<String>, StorageError>;

    // =========================================================================
    // RAW WRITES AND SCHEMA
    // =========================================================================

    /// Write `value` into the first value column of a row.
    fn put(&self, table: &str, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    fn remove(&self, table: &str, key: &str) -> Result<(), StorageError>;

    /// Register a table. Idempotent for an identical descriptor.
    fn create_table(&self, table_info: TableInfo) -> Result<(), StorageError>;

    fn table_info(&self, name: &str) -> Option<TableInfo>;
}
