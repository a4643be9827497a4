//! # Domain Errors
//!
//! Error types for the Storage Service.
//!
//! Every [`StorageError`] maps to exactly one wire code through
//! [`StorageError::code`]. Storage errors never cross the remote boundary as
//! Rust errors: the server adapter turns them into a `WireError`.

use shared_types::{error_codes, BlockNumber, ServiceError};
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    // =========================================================================
    // STAGING (rejected before anything is written)
    // =========================================================================
    /// Mutations reference a table that was never created.
    #[error("unknown table: {table}")]
    UnknownTable { table: String },

    /// Mutations carry a descriptor that differs from the registered one.
    #[error("table descriptor mismatch for {table}")]
    TableInfoMismatch { table: String },

    /// A row sets a column the table does not declare.
    #[error("column {column} is not declared by table {table}")]
    UnknownColumn { table: String, column: String },

    /// `create_table` with a descriptor that conflicts with the registered one.
    #[error("table {table} already exists with a different descriptor")]
    TableConflict { table: String },

    /// Table name is empty or contains a NUL byte.
    #[error("invalid table name: {table:?}")]
    InvalidTableName { table: String },

    /// Raw write against a table without value columns.
    #[error("table {table} declares no value column")]
    NoValueColumn { table: String },

    /// Staging a new block number would exceed the configured capacity.
    #[error("state cache full: {capacity} block numbers already staged")]
    StagingCapacityExceeded { capacity: usize },

    /// `table_infos` and mutation data have different lengths.
    #[error("commit shape mismatch: {table_infos} table infos, {datas} data sets")]
    CommitShapeMismatch { table_infos: usize, datas: usize },

    /// One block carries two mutation sets for the same table.
    #[error("table {table} appears more than once in one block")]
    DuplicateTable { table: String },

    // =========================================================================
    // NOT FOUND
    // =========================================================================
    #[error("no state cache staged for block {block_number}")]
    StateCacheNotFound { block_number: BlockNumber },

    #[error("row {key} not found in {table}")]
    RowNotFound { table: String, key: String },

    #[error("table not found: {table}")]
    TableNotFound { table: String },

    // =========================================================================
    // COMMIT ORDERING
    // =========================================================================
    /// Block numbers must strictly increase.
    #[error("stale commit: block {requested} is not above last committed block {last_committed}")]
    StaleCommit {
        requested: BlockNumber,
        last_committed: BlockNumber,
    },

    // =========================================================================
    // FAULTS
    // =========================================================================
    /// The key-value store failed; the batch was rolled back.
    #[error("storage fault: {message}")]
    StorageFault { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl StorageError {
    /// Wire code reported for this error.
    pub fn code(&self) -> i32 {
        match self {
            StorageError::UnknownTable { .. }
            | StorageError::TableInfoMismatch { .. }
            | StorageError::UnknownColumn { .. }
            | StorageError::TableConflict { .. }
            | StorageError::InvalidTableName { .. }
            | StorageError::NoValueColumn { .. }
            | StorageError::StagingCapacityExceeded { .. }
            | StorageError::CommitShapeMismatch { .. }
            | StorageError::DuplicateTable { .. } => error_codes::STAGING_ERROR,

            StorageError::StateCacheNotFound { .. }
            | StorageError::RowNotFound { .. }
            | StorageError::TableNotFound { .. } => error_codes::NOT_FOUND,

            StorageError::StaleCommit { .. } => error_codes::STALE_COMMIT,

            StorageError::StorageFault { .. } | StorageError::Serialization { .. } => {
                error_codes::STORAGE_FAULT
            }
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::new(err.code(), err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl From<std::io::Error> for KVStoreError {
    fn from(err: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

impl From<KVStoreError> for StorageError {
    fn from(err: KVStoreError) -> Self {
        StorageError::StorageFault {
            message: err.to_string(),
        }
    }
}
