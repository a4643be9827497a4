//! # Node Configuration
//!
//! Unified configuration for the service adapters and runtime parameters.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QC_STORAGE_BACKEND` | `storage.backend` (`memory`, `file`, or `rocksdb` with the feature) |
//! | `QC_DATA_DIR` | `storage.data_dir` |
//! | `QC_MAX_STAGED_BLOCKS` | `storage.max_staged_blocks` |
//! | `QC_TABLES` | `storage.tables`, as `name:key:col1,col2;name2:key` |
//! | `QC_TX_POOL_CAPACITY` | `txpool.capacity` |
//! | `QC_CALL_TIMEOUT_MS` | `bridge.call_timeout_ms` |
//! | `QC_LOG` | `logging.filter` |

use qc_02_storage_service::DEFAULT_MAX_STAGED_BLOCKS;
use qc_06_txpool_service::DEFAULT_TX_POOL_CAPACITY;
use shared_bridge::DEFAULT_CALL_TIMEOUT_MS;
use shared_types::TableInfo;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Transaction pool configuration.
    pub txpool: TxPoolConfig,
    /// Outbound call configuration.
    pub bridge: BridgeConfig,
    /// Log filter configuration.
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("QC_STORAGE_BACKEND") {
            config.storage.backend = parse("QC_STORAGE_BACKEND", &value)?;
        }
        if let Some(value) = lookup("QC_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("QC_MAX_STAGED_BLOCKS") {
            config.storage.max_staged_blocks = parse("QC_MAX_STAGED_BLOCKS", &value)?;
        }
        if let Some(value) = lookup("QC_TABLES") {
            config.storage.tables = parse_tables(&value)?;
        }
        if let Some(value) = lookup("QC_TX_POOL_CAPACITY") {
            config.txpool.capacity = parse("QC_TX_POOL_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("QC_CALL_TIMEOUT_MS") {
            config.bridge.call_timeout_ms = parse("QC_CALL_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("QC_LOG") {
            config.logging.filter = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.max_staged_blocks == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.txpool.capacity == 0 {
            return Err(ConfigError::ZeroPoolCapacity);
        }
        if self.bridge.call_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {variable}")]
    InvalidValue { variable: String, value: String },

    #[error("invalid table spec {spec:?}, expected name:key[:col1,col2]")]
    InvalidTable { spec: String },

    #[error("max_staged_blocks must be at least 1")]
    ZeroCapacity,

    #[error("tx pool capacity must be at least 1")]
    ZeroPoolCapacity,

    #[error("call_timeout_ms must be at least 1")]
    ZeroTimeout,
}

fn parse<T: FromStr>(variable: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        variable: variable.to_string(),
        value: value.to_string(),
    })
}

fn parse_tables(value: &str) -> Result<Vec<TableInfo>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .map(|spec| {
            let invalid = || ConfigError::InvalidTable {
                spec: spec.to_string(),
            };
            let mut parts = spec.splitn(3, ':');
            let name = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
            let key = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
            let fields = parts
                .next()
                .map(|cols| {
                    cols.split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default();
            Ok(TableInfo::new(name, key, fields))
        })
        .collect()
}

/// Key-value backend of the storage service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Volatile in-process map.
    #[default]
    Memory,
    /// Single data file under `data_dir`.
    File,
    /// RocksDB database under `data_dir`.
    #[cfg(feature = "rocksdb")]
    RocksDb,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            #[cfg(feature = "rocksdb")]
            "rocksdb" => Ok(Self::RocksDb),
            _ => Err(()),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data directory for the file and RocksDB backends.
    pub data_dir: PathBuf,
    /// Maximum distinct block numbers staged at once.
    pub max_staged_blocks: usize,
    /// Tables registered at startup.
    pub tables: Vec<TableInfo>,
}

impl StorageConfig {
    /// Name of the data file inside `data_dir`.
    pub const DATA_FILE: &'static str = "state.db";

    /// Name of the RocksDB directory inside `data_dir`.
    pub const ROCKSDB_DIR: &'static str = "rocksdb";

    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(Self::DATA_FILE)
    }

    pub fn rocksdb_dir(&self) -> PathBuf {
        self.data_dir.join(Self::ROCKSDB_DIR)
    }

    /// Settings handed to the storage service.
    pub fn service_config(&self) -> qc_02_storage_service::StorageConfig {
        qc_02_storage_service::StorageConfig::new().with_max_staged_blocks(self.max_staged_blocks)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
            max_staged_blocks: DEFAULT_MAX_STAGED_BLOCKS,
            tables: Vec::new(),
        }
    }
}

/// Transaction pool configuration.
#[derive(Debug, Clone)]
pub struct TxPoolConfig {
    /// Maximum unsealed transactions held at once.
    pub capacity: usize,
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TX_POOL_CAPACITY,
        }
    }
}

/// Outbound call configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Per-call timeout enforced by the transport.
    pub call_timeout_ms: u64,
}

impl BridgeConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,qc_02_storage_service=debug`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.max_staged_blocks, DEFAULT_MAX_STAGED_BLOCKS);
        assert_eq!(config.txpool.capacity, DEFAULT_TX_POOL_CAPACITY);
        assert_eq!(config.bridge.call_timeout_ms, DEFAULT_CALL_TIMEOUT_MS);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_env_overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("QC_STORAGE_BACKEND", "FILE"),
            ("QC_DATA_DIR", "/var/lib/qc"),
            ("QC_MAX_STAGED_BLOCKS", "16"),
            ("QC_CALL_TIMEOUT_MS", "250"),
            ("QC_TX_POOL_CAPACITY", "8"),
            ("QC_TABLES", "t_test:id:value; t_keys:id"),
        ]))
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.data_file(), PathBuf::from("/var/lib/qc/state.db"));
        assert_eq!(config.storage.max_staged_blocks, 16);
        assert_eq!(config.bridge.call_timeout(), Duration::from_millis(250));
        assert_eq!(config.txpool.capacity, 8);
        assert_eq!(
            config.storage.tables,
            vec![
                TableInfo::new("t_test", "id", vec!["value".into()]),
                TableInfo::new("t_keys", "id", vec![]),
            ]
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            NodeConfig::from_lookup(lookup(&[("QC_STORAGE_BACKEND", "rocks")])).unwrap_err(),
            ConfigError::InvalidValue {
                variable: "QC_STORAGE_BACKEND".into(),
                value: "rocks".into()
            }
        );
        assert_eq!(
            NodeConfig::from_lookup(lookup(&[("QC_MAX_STAGED_BLOCKS", "0")])).unwrap_err(),
            ConfigError::ZeroCapacity
        );
        assert_eq!(
            NodeConfig::from_lookup(lookup(&[("QC_TX_POOL_CAPACITY", "0")])).unwrap_err(),
            ConfigError::ZeroPoolCapacity
        );
        assert_eq!(
            NodeConfig::from_lookup(lookup(&[("QC_CALL_TIMEOUT_MS", "0")])).unwrap_err(),
            ConfigError::ZeroTimeout
        );
        assert!(matches!(
            NodeConfig::from_lookup(lookup(&[("QC_TABLES", ":id")])),
            Err(ConfigError::InvalidTable { .. })
        ));
    }
}
