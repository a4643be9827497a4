//! Single-node engines.
//!
//! Used by the node runtime when no external consensus or sync engine is
//! attached: one sealer, no view changes, and a sync status that always
//! reports the local head.

use crate::ports::{BlockSyncEngine, ConsensusEngine};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Block, BlockNumber, LedgerConfig, NodeId, ServiceError, ViewNumber};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Proposal for a block at or below the ledger head.
pub const STALE_PROPOSAL: i32 = 3001;

#[derive(Debug, Default)]
struct ChainHead {
    ledger: Option<LedgerConfig>,
    last_proposal: Option<BlockNumber>,
    unsealed_txs_size: u64,
    messages_received: u64,
}

/// Consensus engine for a single sealer.
#[derive(Debug, Default)]
pub struct StandaloneConsensusEngine {
    head: RwLock<ChainHead>,
}

impl StandaloneConsensusEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block number of the last finalized block, if any was announced.
    pub fn head_number(&self) -> Option<BlockNumber> {
        self.head.read().ledger.as_ref().map(|l| l.block_number)
    }

    pub fn head_hash(&self) -> Option<Vec<u8>> {
        self.head.read().ledger.as_ref().map(|l| l.block_hash.clone())
    }

    pub fn last_proposal(&self) -> Option<BlockNumber> {
        self.head.read().last_proposal
    }

    pub fn unsealed_txs_size(&self) -> u64 {
        self.head.read().unsealed_txs_size
    }

    pub fn messages_received(&self) -> u64 {
        self.head.read().messages_received
    }
}

#[async_trait]
impl ConsensusEngine for StandaloneConsensusEngine {
    async fn submit_proposal(
        &self,
        data: Vec<u8>,
        index: BlockNumber,
        hash: Vec<u8>,
    ) -> Result<(), ServiceError> {
        let mut head = self.head.write();
        let floor = head.ledger.as_ref().map(|l| l.block_number);
        if floor.is_some_and(|n| index <= n) {
            warn!(index = index, head = ?floor, "Rejected stale proposal");
            return Err(ServiceError::new(
                STALE_PROPOSAL,
                format!("proposal {index} is not above head {floor:?}"),
            ));
        }

        head.last_proposal = Some(index);
        debug!(index = index, bytes = data.len(), hash_len = hash.len(), "Proposal accepted");
        Ok(())
    }

    async fn get_pbft_view(&self) -> Result<ViewNumber, ServiceError> {
        // A single sealer never changes view.
        Ok(0)
    }

    async fn check_block(&self, block: Block) -> Result<bool, ServiceError> {
        let head = self.head.read();
        let verified = match &head.ledger {
            Some(ledger) => {
                block.number == ledger.block_number + 1 && block.parent_hash == ledger.block_hash
            }
            None => true,
        };
        debug!(number = block.number, verified = verified, "Checked block");
        Ok(verified)
    }

    async fn notify_new_block(&self, ledger_config: LedgerConfig) -> Result<(), ServiceError> {
        info!(
            block_number = ledger_config.block_number,
            sealers = ledger_config.sealer_list.len(),
            "New block finalized"
        );
        self.head.write().ledger = Some(ledger_config);
        Ok(())
    }

    async fn notify_consensus_message(
        &self,
        uuid: String,
        node_id: NodeId,
        data: Vec<u8>,
    ) -> Result<(), ServiceError> {
        self.head.write().messages_received += 1;
        debug!(uuid = %uuid, from = %node_id, bytes = data.len(), "Consensus message");
        Ok(())
    }

    async fn note_unsealed_txs_size(&self, unsealed_txs_size: u64) -> Result<(), ServiceError> {
        self.head.write().unsealed_txs_size = unsealed_txs_size;
        Ok(())
    }
}

/// Sync engine that reports the standalone consensus head.
pub struct StandaloneSyncEngine {
    consensus: Arc<StandaloneConsensusEngine>,
}

impl StandaloneSyncEngine {
    pub fn new(consensus: Arc<StandaloneConsensusEngine>) -> Self {
        Self { consensus }
    }
}

#[async_trait]
impl BlockSyncEngine for StandaloneSyncEngine {
    async fn get_sync_info(&self) -> Result<String, ServiceError> {
        let info = serde_json::json!({
            "isSyncing": false,
            "blockNumber": self.consensus.head_number().unwrap_or(-1),
            "blockHash": hex::encode(self.consensus.head_hash().unwrap_or_default()),
            "unsealedTxs": self.consensus.unsealed_txs_size(),
            "peers": [],
        });
        Ok(info.to_string())
    }
}
