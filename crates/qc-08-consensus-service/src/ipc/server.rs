//! # Consensus and Sync Endpoints
//!
//! Decode a request, forward it to the engine, and answer with the engine's
//! outcome in the response's `error` field. Engine error codes cross the
//! boundary unchanged.

use crate::ports::{BlockSyncEngine, ConsensusEngine};
use async_trait::async_trait;
use shared_bridge::{decode_request, encode_response, ServiceEndpoint, TransportFault};
use shared_types::ipc::{methods, services};
use shared_types::{
    CheckBlockRequest, CheckBlockResponse, GetPbftViewResponse, GetSyncInfoResponse,
    NoteUnsealedTxsSizeRequest, NotifyConsensusMessageRequest, NotifyNewBlockRequest,
    ServiceError, StatusResponse, SubmitProposalRequest, WireError,
};
use std::sync::Arc;
use tracing::{debug, warn};

fn split<T: Default>(method: &str, result: Result<T, ServiceError>) -> (WireError, T) {
    match result {
        Ok(value) => (WireError::success(), value),
        Err(e) => {
            warn!(method = method, code = e.code, error = %e.message, "Engine call failed");
            (e.into(), T::default())
        }
    }
}

fn unknown(service: &str, method: &str) -> TransportFault {
    TransportFault::UnknownMethod {
        service: service.to_string(),
        method: method.to_string(),
    }
}

// =============================================================================
// PBFT SERVICE
// =============================================================================

/// Transport endpoint for a [`ConsensusEngine`].
pub struct PbftServiceServer<E: ConsensusEngine + 'static> {
    engine: Arc<E>,
}

impl<E: ConsensusEngine + 'static> PbftServiceServer<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: ConsensusEngine + 'static> ServiceEndpoint for PbftServiceServer<E> {
    fn service_name(&self) -> &'static str {
        services::PBFT
    }

    async fn dispatch(&self, method: &str, payload: &[u8]) -> Result<Vec<u8>, TransportFault> {
        debug!(method = method, bytes = payload.len(), "PBFT request");

        match method {
            methods::SUBMIT_PROPOSAL => {
                let req: SubmitProposalRequest = decode_request(payload)?;
                let result = self
                    .engine
                    .submit_proposal(req.data, req.index, req.hash)
                    .await;
                let (error, ()) = split(method, result);
                encode_response(&StatusResponse::new(error))
            }
            methods::GET_PBFT_VIEW => {
                let (error, view) = split(method, self.engine.get_pbft_view().await);
                encode_response(&GetPbftViewResponse { error, view })
            }
            methods::CHECK_BLOCK => {
                let req: CheckBlockRequest = decode_request(payload)?;
                let (error, verify_result) = split(method, self.engine.check_block(req.block).await);
                encode_response(&CheckBlockResponse {
                    error,
                    verify_result,
                })
            }
            methods::NOTIFY_NEW_BLOCK => {
                let req: NotifyNewBlockRequest = decode_request(payload)?;
                let (error, ()) = split(method, self.engine.notify_new_block(req.ledger_config).await);
                encode_response(&StatusResponse::new(error))
            }
            methods::NOTIFY_CONSENSUS_MESSAGE => {
                let req: NotifyConsensusMessageRequest = decode_request(payload)?;
                let result = self
                    .engine
                    .notify_consensus_message(req.uuid, req.node_id, req.data)
                    .await;
                let (error, ()) = split(method, result);
                encode_response(&StatusResponse::new(error))
            }
            methods::NOTE_UNSEALED_TXS_SIZE => {
                let req: NoteUnsealedTxsSizeRequest = decode_request(payload)?;
                let result = self.engine.note_unsealed_txs_size(req.unsealed_txs_size).await;
                let (error, ()) = split(method, result);
                encode_response(&StatusResponse::new(error))
            }
            _ => Err(unknown(services::PBFT, method)),
        }
    }
}

// =============================================================================
// BLOCK SYNC SERVICE
// =============================================================================

/// Transport endpoint for a [`BlockSyncEngine`].
pub struct BlockSyncServiceServer<E: BlockSyncEngine + 'static> {
    engine: Arc<E>,
}

impl<E: BlockSyncEngine + 'static> BlockSyncServiceServer<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: BlockSyncEngine + 'static> ServiceEndpoint for BlockSyncServiceServer<E> {
    fn service_name(&self) -> &'static str {
        services::BLOCK_SYNC
    }

    async fn dispatch(&self, method: &str, payload: &[u8]) -> Result<Vec<u8>, TransportFault> {
        debug!(method = method, bytes = payload.len(), "Sync request");

        match method {
            methods::GET_SYNC_INFO => {
                let (error, sync_info) = split(method, self.engine.get_sync_info().await);
                encode_response(&GetSyncInfoResponse { error, sync_info })
            }
            _ => Err(unknown(services::BLOCK_SYNC, method)),
        }
    }
}
