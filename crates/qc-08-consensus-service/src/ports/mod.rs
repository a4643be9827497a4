//! Ports for the consensus and sync adapters.
//!
//! - `outbound`: the engines the server endpoints forward to

pub mod outbound;

pub use outbound::{BlockSyncEngine, ConsensusEngine};
