//! # Consensus and Sync Clients
//!
//! Outbound adapters used by the sync module, the front service and the
//! transaction pool. Each method hands its handler to the completion bridge
//! and returns the correlation id at once.
//!
//! ## Sentinels
//!
//! | Call | Sentinel |
//! |------|----------|
//! | `get_pbft_view` | `0` |
//! | `check_block` | `false` |
//! | `get_sync_info` | `""` |
//! | every notification | none (error only) |
//!
//! A failed `get_sync_info` delivers the empty string, never an
//! exception-marker string, so callers tell failure apart by the error alone.

use serde::Serialize;
use shared_bridge::{CompletionBridge, CorrelationId};
use shared_types::ipc::{methods, services};
use shared_types::{
    Block, BlockNumber, CheckBlockRequest, CheckBlockResponse, GetPbftViewRequest,
    GetPbftViewResponse, GetSyncInfoRequest, GetSyncInfoResponse, LedgerConfig, NodeId,
    NoteUnsealedTxsSizeRequest, NotifyConsensusMessageRequest, NotifyNewBlockRequest,
    ServiceError, StatusResponse, SubmitProposalRequest, ViewNumber,
};

/// Outbound calls to `PBFTService`.
#[derive(Clone)]
pub struct PbftServiceClient {
    bridge: CompletionBridge,
}

impl PbftServiceClient {
    pub fn new(bridge: CompletionBridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &CompletionBridge {
        &self.bridge
    }

    fn status_call<Req, H>(&self, method: &'static str, request: &Req, handler: H) -> CorrelationId
    where
        Req: Serialize,
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        self.bridge.call(
            services::PBFT,
            method,
            request,
            (),
            |_: StatusResponse| (),
            move |error, ()| handler(error),
        )
    }

    pub fn submit_proposal<H>(
        &self,
        data: Vec<u8>,
        index: BlockNumber,
        hash: Vec<u8>,
        handler: H,
    ) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        let request = SubmitProposalRequest { data, index, hash };
        self.status_call(methods::SUBMIT_PROPOSAL, &request, handler)
    }

    pub fn get_pbft_view<H>(&self, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, ViewNumber) + Send + 'static,
    {
        self.bridge.call(
            services::PBFT,
            methods::GET_PBFT_VIEW,
            &GetPbftViewRequest,
            0,
            |r: GetPbftViewResponse| r.view,
            handler,
        )
    }

    /// Called by the sync module to verify a downloaded block.
    pub fn check_block<H>(&self, block: Block, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, bool) + Send + 'static,
    {
        self.bridge.call(
            services::PBFT,
            methods::CHECK_BLOCK,
            &CheckBlockRequest { block },
            false,
            |r: CheckBlockResponse| r.verify_result,
            handler,
        )
    }

    pub fn notify_new_block<H>(&self, ledger_config: LedgerConfig, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        self.status_call(
            methods::NOTIFY_NEW_BLOCK,
            &NotifyNewBlockRequest { ledger_config },
            handler,
        )
    }

    /// Called by the front service to dispatch a peer's message.
    pub fn notify_consensus_message<H>(
        &self,
        uuid: &str,
        node_id: NodeId,
        data: Vec<u8>,
        handler: H,
    ) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        let request = NotifyConsensusMessageRequest {
            uuid: uuid.to_string(),
            node_id,
            data,
        };
        self.status_call(methods::NOTIFY_CONSENSUS_MESSAGE, &request, handler)
    }

    /// Called by the transaction pool.
    pub fn note_unsealed_txs_size<H>(&self, unsealed_txs_size: u64, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        self.status_call(
            methods::NOTE_UNSEALED_TXS_SIZE,
            &NoteUnsealedTxsSizeRequest { unsealed_txs_size },
            handler,
        )
    }
}

/// Outbound calls to `BlockSyncService`.
#[derive(Clone)]
pub struct BlockSyncServiceClient {
    bridge: CompletionBridge,
}

impl BlockSyncServiceClient {
    pub fn new(bridge: CompletionBridge) -> Self {
        Self { bridge }
    }

    pub fn get_sync_info<H>(&self, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, String) + Send + 'static,
    {
        self.bridge.call(
            services::BLOCK_SYNC,
            methods::GET_SYNC_INFO,
            &GetSyncInfoRequest,
            String::new(),
            |r: GetSyncInfoResponse| r.sync_info,
            handler,
        )
    }
}
