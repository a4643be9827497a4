//! # Adapters Module
//!
//! - `standalone`: single-node consensus and sync engines

pub mod standalone;

pub use standalone::{StandaloneConsensusEngine, StandaloneSyncEngine, STALE_PROPOSAL};
