//! # Storage Endpoint
//!
//! Serves `StorageService` methods to the transport: decodes the request body,
//! calls the [`StorageServiceApi`], and encodes a response whose `error`
//! field carries the outcome.
//!
//! Every call runs on the blocking pool, never on a runtime worker.
//!
//! Domain failures travel inside the response body with their positive
//! codes. Only undecodable requests and unknown methods surface as transport
//! faults.

use crate::domain::errors::StorageError;
use crate::ports::inbound::StorageServiceApi;
use async_trait::async_trait;
use shared_bridge::{decode_request, encode_response, ServiceEndpoint, TransportFault};
use shared_types::ipc::{methods, services};
use shared_types::{
    AddStateCacheRequest, CommitBlockRequest, CommitBlockResponse, CreateTableRequest,
    DropStateCacheRequest, GetBatchRequest, GetBatchResponse, GetPrimaryKeysRequest,
    GetPrimaryKeysResponse, GetRequest, GetResponse, GetRowRequest, GetRowResponse,
    GetRowsRequest, GetRowsResponse, GetStateCacheRequest, GetStateCacheResponse, PutRequest,
    RemoveRequest, ServiceError, StatusResponse, WireError,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transport endpoint for a [`StorageServiceApi`].
pub struct StorageServiceServer<A: StorageServiceApi + 'static> {
    service: Arc<A>,
}

impl<A: StorageServiceApi + 'static> StorageServiceServer<A> {
    pub fn new(service: Arc<A>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<A> {
        &self.service
    }

    /// Run `f` on the blocking pool. Every storage call may wait on the
    /// commit lock, a stage slot, or the disk.
    async fn blocking<R, F>(&self, f: F) -> Result<R, TransportFault>
    where
        R: Send + 'static,
        F: FnOnce(&A) -> R + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || f(&service))
            .await
            .map_err(|e| TransportFault::Exception(e.to_string()))
    }
}

/// Split a domain result into the wire error and the value slot.
fn split<T: Default>(method: &str, result: Result<T, StorageError>) -> (WireError, T) {
    match result {
        Ok(value) => (WireError::success(), value),
        Err(e) => {
            warn!(method = method, code = e.code(), error = %e, "Storage call failed");
            (ServiceError::from(e).into(), T::default())
        }
    }
}

#[async_trait]
impl<A: StorageServiceApi + 'static> ServiceEndpoint for StorageServiceServer<A> {
    fn service_name(&self) -> &'static str {
        services::STORAGE
    }

    async fn dispatch(&self, method: &str, payload: &[u8]) -> Result<Vec<u8>, TransportFault> {
        debug!(method = method, bytes = payload.len(), "Storage request");

        match method {
            methods::ADD_STATE_CACHE => {
                let req: AddStateCacheRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.add_state_cache(req.block_number, req.mutations))
                    .await?;
                let (error, ()) = split(method, result);
                encode_response(&StatusResponse::new(error))
            }
            methods::DROP_STATE_CACHE => {
                let req: DropStateCacheRequest = decode_request(payload)?;
                self.blocking(move |service| service.drop_state_cache(req.block_number))
                    .await?;
                encode_response(&StatusResponse::new(WireError::success()))
            }
            methods::GET_STATE_CACHE => {
                let req: GetStateCacheRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.get_state_cache(req.block_number))
                    .await?;
                let (error, mutations) = split(method, result);
                encode_response(&GetStateCacheResponse { error, mutations })
            }
            methods::COMMIT_BLOCK => {
                let req: CommitBlockRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| {
                        service.commit_block(req.block_number, req.table_infos, req.datas)
                    })
                    .await?;
                let (error, count) = split(method, result);
                encode_response(&CommitBlockResponse { error, count })
            }
            methods::GET => {
                let req: GetRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.get(&req.column_family, &req.key))
                    .await?;
                let (error, value) = split(method, result);
                encode_response(&GetResponse { error, value })
            }
            methods::GET_BATCH => {
                let req: GetBatchRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.get_batch(&req.column_family, &req.keys))
                    .await?;
                let (error, values) = split(method, result);
                encode_response(&GetBatchResponse { error, values })
            }
            methods::GET_ROW => {
                let req: GetRowRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.get_row(&req.table_info, &req.key).map(Some))
                    .await?;
                let (error, row) = split(method, result);
                encode_response(&GetRowResponse { error, row })
            }
            methods::GET_ROWS => {
                let req: GetRowsRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.get_rows(&req.table_info, &req.keys))
                    .await?;
                let (error, rows) = split(method, result);
                encode_response(&GetRowsResponse { error, rows })
            }
            methods::GET_PRIMARY_KEYS => {
                let req: GetPrimaryKeysRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| {
                        service.get_primary_keys(&req.table_info, &req.condition)
                    })
                    .await?;
                let (error, keys) = split(method, result);
                encode_response(&GetPrimaryKeysResponse { error, keys })
            }
            methods::PUT => {
                let req: PutRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.put(&req.column_family, &req.key, req.value))
                    .await?;
                let (error, ()) = split(method, result);
                encode_response(&StatusResponse::new(error))
            }
            methods::REMOVE => {
                let req: RemoveRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.remove(&req.column_family, &req.key))
                    .await?;
                let (error, ()) = split(method, result);
                encode_response(&StatusResponse::new(error))
            }
            methods::CREATE_TABLE => {
                let req: CreateTableRequest = decode_request(payload)?;
                let result = self
                    .blocking(move |service| service.create_table(req.table_info))
                    .await?;
                let (error, ()) = split(method, result);
                encode_response(&StatusResponse::new(error))
            }
            _ => Err(TransportFault::UnknownMethod {
                service: services::STORAGE.to_string(),
                method: method.to_string(),
            }),
        }
    }
}
