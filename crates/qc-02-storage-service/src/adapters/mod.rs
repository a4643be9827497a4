//! # Adapters Module
//!
//! ## Modules
//!
//! - `storage`: key-value store implementations (memory, file, RocksDB)
//! - `lock`: data directory process locking (singleton guard)

#[cfg(feature = "locking")]
pub mod lock;
pub mod storage;

#[cfg(feature = "locking")]
pub use lock::{DatabaseLock, LockError};
pub use storage::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use storage::{RocksDbConfig, RocksDbKVStore};
