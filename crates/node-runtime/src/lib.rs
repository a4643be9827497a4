//! # Node Runtime Library
//!
//! Wiring of the node's service adapters, exposed for the binary and for
//! integration tests.
//!
//! - `container/` - configuration and the service container
//! - `logging` - tracing subscriber setup
//! - `runtime` - background tasks and shutdown

pub mod container;
pub mod logging;
pub mod runtime;

pub use container::{ConfigError, ContainerError, NodeConfig, ServiceContainer};
pub use runtime::{NodeRuntime, NodeStatus};
