//! # Remote Call Payloads
//!
//! Request and response bodies for every remote method, grouped by service.
//!
//! ## Design Rules
//!
//! - Every response carries a [`WireError`] as its `error` field; callers check
//!   its code before trusting any other field.
//! - Payloads are wrapped in [`crate::envelope::RemoteRequest`] /
//!   [`crate::envelope::RemoteResponse`], which own correlation.

use crate::entities::*;
use crate::errors::WireError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Remote service names.
pub mod services {
    pub const PBFT: &str = "PBFTService";
    pub const BLOCK_SYNC: &str = "BlockSyncService";
    pub const STORAGE: &str = "StorageService";
    pub const TX_POOL: &str = "TxPoolService";
}

/// Remote method names.
pub mod methods {
    // PBFTService
    pub const SUBMIT_PROPOSAL: &str = "submitProposal";
    pub const GET_PBFT_VIEW: &str = "getPBFTView";
    pub const CHECK_BLOCK: &str = "checkBlock";
    pub const NOTIFY_NEW_BLOCK: &str = "notifyNewBlock";
    pub const NOTIFY_CONSENSUS_MESSAGE: &str = "notifyConsensusMessage";
    pub const NOTE_UNSEALED_TXS_SIZE: &str = "noteUnSealedTxsSize";

    // BlockSyncService
    pub const GET_SYNC_INFO: &str = "getSyncInfo";

    // StorageService
    pub const ADD_STATE_CACHE: &str = "addStateCache";
    pub const COMMIT_BLOCK: &str = "commitBlock";
    pub const DROP_STATE_CACHE: &str = "dropStateCache";
    pub const GET_STATE_CACHE: &str = "getStateCache";
    pub const GET: &str = "get";
    pub const GET_BATCH: &str = "getBatch";
    pub const GET_ROW: &str = "getRow";
    pub const GET_ROWS: &str = "getRows";
    pub const GET_PRIMARY_KEYS: &str = "getPrimaryKeys";
    pub const PUT: &str = "put";
    pub const REMOVE: &str = "remove";
    pub const CREATE_TABLE: &str = "createTable";

    // TxPoolService
    pub const SUBMIT_TRANSACTION: &str = "submit";
}

/// Access to the error field every response body carries.
pub trait RemoteResponsePayload {
    fn wire_error(&self) -> &WireError;
}

macro_rules! impl_remote_response {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RemoteResponsePayload for $ty {
                fn wire_error(&self) -> &WireError {
                    &self.error
                }
            }
        )*
    };
}

/// Response for methods that only report success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StatusResponse {
    pub error: WireError,
}

impl StatusResponse {
    pub fn new(error: WireError) -> Self {
        Self { error }
    }
}

// =============================================================================
// PBFT SERVICE
// =============================================================================

/// A sealed proposal handed to consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitProposalRequest {
    /// Encoded proposal body.
    pub data: Vec<u8>,
    /// Block number the proposal is for.
    pub index: BlockNumber,
    /// Proposal hash.
    pub hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetPbftViewRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetPbftViewResponse {
    pub error: WireError,
    pub view: ViewNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckBlockRequest {
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CheckBlockResponse {
    pub error: WireError,
    pub verify_result: bool,
}

/// Sync informs consensus that a new block was finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyNewBlockRequest {
    pub ledger_config: LedgerConfig,
}

/// A consensus message received from a peer node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConsensusMessageRequest {
    /// Message identifier used by the front service to route the reply.
    pub uuid: String,
    /// Sending node.
    pub node_id: NodeId,
    /// Encoded consensus message.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUnsealedTxsSizeRequest {
    pub unsealed_txs_size: u64,
}

// =============================================================================
// BLOCK SYNC SERVICE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetSyncInfoRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetSyncInfoResponse {
    pub error: WireError,
    /// Human-readable sync status document.
    pub sync_info: String,
}

// =============================================================================
// STORAGE SERVICE
// =============================================================================

/// Stage mutations for a not-yet-committed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddStateCacheRequest {
    pub block_number: BlockNumber,
    pub mutations: Vec<TableMutationSet>,
}

/// Commit a block. Empty `table_infos` and `datas` commit the staged entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitBlockRequest {
    pub block_number: BlockNumber,
    pub table_infos: Vec<TableInfo>,
    /// `datas[i]` holds the rows for `table_infos[i]`.
    pub datas: Vec<BTreeMap<String, Entry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommitBlockResponse {
    pub error: WireError,
    /// Rows applied, live and tombstone alike.
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropStateCacheRequest {
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStateCacheRequest {
    pub block_number: BlockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetStateCacheResponse {
    pub error: WireError,
    pub mutations: Vec<TableMutationSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub column_family: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetResponse {
    pub error: WireError,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBatchRequest {
    pub column_family: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetBatchResponse {
    pub error: WireError,
    /// Positional: `values[i]` answers `keys[i]`; missing keys are empty.
    pub values: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRowRequest {
    pub table_info: TableInfo,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetRowResponse {
    pub error: WireError,
    pub row: Option<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRowsRequest {
    pub table_info: TableInfo,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetRowsResponse {
    pub error: WireError,
    /// Present keys only.
    pub rows: BTreeMap<String, Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPrimaryKeysRequest {
    pub table_info: TableInfo,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GetPrimaryKeysResponse {
    pub error: WireError,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutRequest {
    pub column_family: String,
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub column_family: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub table_info: TableInfo,
}

// =============================================================================
// TX POOL SERVICE
// =============================================================================

/// An encoded transaction submitted to the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransactionRequest {
    pub tx: Vec<u8>,
}

/// Outcome of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSubmitResult {
    /// Keccak-256 of the encoded transaction.
    pub tx_hash: Vec<u8>,
    /// Hash of the sealing block, empty while the transaction is unsealed.
    pub block_hash: Vec<u8>,
    /// Number of the sealing block, `-1` while unsealed.
    pub block_number: BlockNumber,
    /// Position in the sealing block, `-1` while unsealed.
    pub transaction_index: i64,
    /// Pool status code; `0` for accepted.
    pub status: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubmitTransactionResponse {
    pub error: WireError,
    /// `None` whenever `error` is not success.
    pub result: Option<TransactionSubmitResult>,
}

impl_remote_response!(
    StatusResponse,
    GetPbftViewResponse,
    CheckBlockResponse,
    GetSyncInfoResponse,
    CommitBlockResponse,
    GetStateCacheResponse,
    GetResponse,
    GetBatchResponse,
    GetRowResponse,
    GetRowsResponse,
    GetPrimaryKeysResponse,
    SubmitTransactionResponse,
);
