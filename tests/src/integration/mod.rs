//! # Integration Flows
//!
//! Storage, consensus and sync adapters talking through the completion
//! bridge and the in-process transport, the way the node wires them.

pub mod commit_flow;
pub mod completion_bridge;
pub mod node_runtime;
