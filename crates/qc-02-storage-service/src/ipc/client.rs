//! # Storage Client
//!
//! Outbound adapter for a remote `StorageService`. Every method returns at
//! once with the call's correlation id; the handler receives the outcome
//! exactly once, with the per-call sentinel in place of the result when the
//! call fails.

use shared_bridge::{CompletionBridge, CorrelationId};
use shared_types::ipc::{methods, services};
use shared_types::{
    AddStateCacheRequest, BlockNumber, CommitBlockRequest, CommitBlockResponse, Condition,
    CreateTableRequest, DropStateCacheRequest, Entry, GetBatchRequest, GetBatchResponse,
    GetPrimaryKeysRequest, GetPrimaryKeysResponse, GetRequest, GetResponse, GetRowRequest,
    GetRowResponse, GetRowsRequest, GetRowsResponse, GetStateCacheRequest, GetStateCacheResponse,
    PutRequest, RemoveRequest, ServiceError, StatusResponse, TableInfo, TableMutationSet,
};
use std::collections::BTreeMap;

/// Outbound storage calls routed through a [`CompletionBridge`].
#[derive(Clone)]
pub struct StorageServiceClient {
    bridge: CompletionBridge,
}

impl StorageServiceClient {
    pub fn new(bridge: CompletionBridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &CompletionBridge {
        &self.bridge
    }

    /// Call a method whose response carries only an error.
    fn status_call<Req, H>(&self, method: &'static str, request: &Req, handler: H) -> CorrelationId
    where
        Req: serde::Serialize,
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        self.bridge.call(
            services::STORAGE,
            method,
            request,
            (),
            |_: StatusResponse| (),
            move |error, ()| handler(error),
        )
    }

    // =========================================================================
    // STATE CACHE
    // =========================================================================

    pub fn add_state_cache<H>(
        &self,
        block_number: BlockNumber,
        mutations: Vec<TableMutationSet>,
        handler: H,
    ) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        let request = AddStateCacheRequest {
            block_number,
            mutations,
        };
        self.status_call(methods::ADD_STATE_CACHE, &request, handler)
    }

    pub fn drop_state_cache<H>(&self, block_number: BlockNumber, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        self.status_call(
            methods::DROP_STATE_CACHE,
            &DropStateCacheRequest { block_number },
            handler,
        )
    }

    /// Sentinel: no mutation sets.
    pub fn get_state_cache<H>(&self, block_number: BlockNumber, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, Vec<TableMutationSet>) + Send + 'static,
    {
        self.bridge.call(
            services::STORAGE,
            methods::GET_STATE_CACHE,
            &GetStateCacheRequest { block_number },
            Vec::new(),
            |r: GetStateCacheResponse| r.mutations,
            handler,
        )
    }

    /// Commit `block_number`. Empty `table_infos` and `datas` commit the
    /// staged entry. Sentinel: `0` rows.
    pub fn commit_block<H>(
        &self,
        block_number: BlockNumber,
        table_infos: Vec<TableInfo>,
        datas: Vec<BTreeMap<String, Entry>>,
        handler: H,
    ) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, u64) + Send + 'static,
    {
        let request = CommitBlockRequest {
            block_number,
            table_infos,
            datas,
        };
        self.bridge.call(
            services::STORAGE,
            methods::COMMIT_BLOCK,
            &request,
            0u64,
            |r: CommitBlockResponse| r.count,
            handler,
        )
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Sentinel: empty value.
    pub fn get<H>(&self, table: &str, key: &str, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, Vec<u8>) + Send + 'static,
    {
        let request = GetRequest {
            column_family: table.to_string(),
            key: key.to_string(),
        };
        self.bridge.call(
            services::STORAGE,
            methods::GET,
            &request,
            Vec::new(),
            |r: GetResponse| r.value,
            handler,
        )
    }

    /// Sentinel: empty vector.
    pub fn get_batch<H>(&self, table: &str, keys: Vec<String>, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, Vec<Vec<u8>>) + Send + 'static,
    {
        let request = GetBatchRequest {
            column_family: table.to_string(),
            keys,
        };
        self.bridge.call(
            services::STORAGE,
            methods::GET_BATCH,
            &request,
            Vec::new(),
            |r: GetBatchResponse| r.values,
            handler,
        )
    }

    /// Sentinel: `None`.
    pub fn get_row<H>(&self, table_info: TableInfo, key: &str, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, Option<Entry>) + Send + 'static,
    {
        let request = GetRowRequest {
            table_info,
            key: key.to_string(),
        };
        self.bridge.call(
            services::STORAGE,
            methods::GET_ROW,
            &request,
            None,
            |r: GetRowResponse| r.row,
            handler,
        )
    }

    pub fn get_rows<H>(&self, table_info: TableInfo, keys: Vec<String>, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, BTreeMap<String, Entry>) + Send + 'static,
    {
        self.bridge.call(
            services::STORAGE,
            methods::GET_ROWS,
            &GetRowsRequest { table_info, keys },
            BTreeMap::new(),
            |r: GetRowsResponse| r.rows,
            handler,
        )
    }

    pub fn get_primary_keys<H>(
        &self,
        table_info: TableInfo,
        condition: Condition,
        handler: H,
    ) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, Vec<String>) + Send + 'static,
    {
        self.bridge.call(
            services::STORAGE,
            methods::GET_PRIMARY_KEYS,
            &GetPrimaryKeysRequest {
                table_info,
                condition,
            },
            Vec::new(),
            |r: GetPrimaryKeysResponse| r.keys,
            handler,
        )
    }

    // =========================================================================
    // RAW WRITES AND TABLES
    // =========================================================================

    pub fn put<H>(&self, table: &str, key: &str, value: Vec<u8>, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        let request = PutRequest {
            column_family: table.to_string(),
            key: key.to_string(),
            value,
        };
        self.status_call(methods::PUT, &request, handler)
    }

    pub fn remove<H>(&self, table: &str, key: &str, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        let request = RemoveRequest {
            column_family: table.to_string(),
            key: key.to_string(),
        };
        self.status_call(methods::REMOVE, &request, handler)
    }

    pub fn create_table<H>(&self, table_info: TableInfo, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>) + Send + 'static,
    {
        self.status_call(methods::CREATE_TABLE, &CreateTableRequest { table_info }, handler)
    }
}
