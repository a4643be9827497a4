//! # qc-08-consensus-service
//!
//! Remote adapters for the node's consensus (`PBFTService`) and block sync
//! (`BlockSyncService`) modules.
//!
//! ## Architecture
//!
//! ```text
//! sync / front / txpool                              consensus node
//! ┌───────────────────┐    CompletionBridge     ┌───────────────────────┐
//! │ PbftServiceClient │ ──────────────────────▶ │ PbftServiceServer     │──▶ ConsensusEngine
//! │ BlockSyncService- │      (transport)        │ BlockSyncServiceServer│──▶ BlockSyncEngine
//! │ Client            │ ◀────────────────────── │                       │
//! └───────────────────┘  handler(error, value)  └───────────────────────┘
//! ```
//!
//! Clients never block: each call returns its correlation id and resolves the
//! supplied handler exactly once, with a sentinel result on failure.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_08_consensus_service::PbftServiceClient;
//!
//! let client = PbftServiceClient::new(bridge);
//! client.get_pbft_view(|error, view| {
//!     if error.is_none() {
//!         tracing::info!(view, "current view");
//!     }
//! });
//! ```

pub mod adapters;
pub mod ipc;
pub mod ports;

pub use adapters::{StandaloneConsensusEngine, StandaloneSyncEngine};
pub use ipc::{BlockSyncServiceClient, BlockSyncServiceServer, PbftServiceClient, PbftServiceServer};
pub use ports::{BlockSyncEngine, ConsensusEngine};
