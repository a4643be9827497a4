//! # Storage Service (qc-02)
//!
//! Staged state-cache commit protocol of the ledger node.
//!
//! ## Protocol
//!
//! ```text
//! executor ──add_state_cache(N)──→ ┐
//!                                   │  StateCacheStore (per-N slots)
//! consensus ──commit_block(N)────→ ├──→ one atomic batch
//!                                   │     rows + last committed N
//! readers ──get / get_batch ─────→ ┘  committed state only
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Staging is volatile | `add_state_cache` never touches durable storage |
//! | Atomic commit | All rows of a block and its number land together or not at all |
//! | Monotonic head | A commit must exceed the last committed block number |
//! | Committed reads | Staged mutations are invisible to every read |
//! | Schema first | Rows for unknown tables or columns are rejected before staging |
//! | Bounded stage | At most `max_staged_blocks` block numbers are staged |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - State cache, schema registry, commit plan, errors
//! - `ports/` - Inbound API and outbound key-value SPI
//! - `adapters/` - In-memory, file-backed and RocksDB stores, data directory lock
//! - `service.rs` - Application service implementing the API
//! - `ipc/` - Transport endpoint and bridge client
//!
//! ## Usage
//!
//! ```ignore
//! use qc_02_storage_service::{StorageService, StorageConfig, StorageServiceApi};
//!
//! let service = StorageService::new_in_memory(StorageConfig::default());
//! service.create_table(table.clone())?;
//! service.add_state_cache(10, mutations)?;
//! let applied = service.commit_block(10, vec![], vec![])?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod service;

#[cfg(test)]
mod test_utils;

// Re-export key types for convenience
pub use adapters::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbKVStore};
#[cfg(feature = "locking")]
pub use adapters::{DatabaseLock, LockError};
pub use domain::entities::StateCacheEntry;
pub use domain::errors::{KVStoreError, StorageError};
pub use domain::state_cache::StateCacheStore;
pub use domain::value_objects::{KeyPrefix, StorageConfig, DEFAULT_MAX_STAGED_BLOCKS};
pub use ports::inbound::StorageServiceApi;
pub use ports::outbound::{BatchOperation, KeyValueStore};
pub use service::StorageService;

// Re-export IPC types
pub use ipc::{StorageServiceClient, StorageServiceServer};
