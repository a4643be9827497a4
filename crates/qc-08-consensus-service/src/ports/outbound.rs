//! Driven ports (Outbound dependencies)
//!
//! The consensus and sync engines themselves live outside this crate. The
//! server endpoints forward every decoded request to one of these traits and
//! report the returned `ServiceError`, if any, on the wire unchanged.

use async_trait::async_trait;
use shared_types::{Block, BlockNumber, LedgerConfig, NodeId, ServiceError, ViewNumber};

/// PBFT engine behind `PBFTService`.
#[async_trait]
pub trait ConsensusEngine: Send + Sync {
    /// Accept a sealed proposal for consensus.
    async fn submit_proposal(
        &self,
        data: Vec<u8>,
        index: BlockNumber,
        hash: Vec<u8>,
    ) -> Result<(), ServiceError>;

    /// Current PBFT view.
    async fn get_pbft_view(&self) -> Result<ViewNumber, ServiceError>;

    /// Verify a block received by the sync module.
    async fn check_block(&self, block: Block) -> Result<bool, ServiceError>;

    /// A new block was finalized and the ledger moved on.
    async fn notify_new_block(&self, ledger_config: LedgerConfig) -> Result<(), ServiceError>;

    /// A consensus message arrived from `node_id`.
    async fn notify_consensus_message(
        &self,
        uuid: String,
        node_id: NodeId,
        data: Vec<u8>,
    ) -> Result<(), ServiceError>;

    /// The transaction pool's count of unsealed transactions.
    async fn note_unsealed_txs_size(&self, unsealed_txs_size: u64) -> Result<(), ServiceError>;
}

/// Block sync engine behind `BlockSyncService`.
#[async_trait]
pub trait BlockSyncEngine: Send + Sync {
    /// Human-readable sync status.
    async fn get_sync_info(&self) -> Result<String, ServiceError>;
}
