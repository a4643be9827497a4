//! # Service Container
//!
//! Central container holding every service adapter with proper lifetime
//! management and dependency injection.
//!
//! - Server endpoints are registered with one in-process transport
//! - Every outbound call goes through one completion bridge

pub mod config;
pub mod services;

pub use config::{
    BridgeConfig, ConfigError, LoggingConfig, NodeConfig, StorageBackend, StorageConfig, TxPoolConfig,
};
pub use services::{ContainerError, NodeStorage, ServiceContainer};
