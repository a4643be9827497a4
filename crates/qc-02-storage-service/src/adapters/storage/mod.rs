//! Key-value store adapters.
//!
//! - `memory`: in-process map, the default backend and the test double
//! - `file`: single-file durable store for nodes without an external database
//! - `rocksdb_store`: RocksDB store (feature `rocksdb`)

mod file;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb_store;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use rocksdb_store::{RocksDbConfig, RocksDbKVStore};
