//! # TxPool Endpoint
//!
//! Decodes a submission, forwards it to the pool engine, and answers with the
//! engine's outcome in the response's `error` field. Pool error codes cross
//! the boundary unchanged.

use crate::ports::TxPoolEngine;
use async_trait::async_trait;
use shared_bridge::{decode_request, encode_response, ServiceEndpoint, TransportFault};
use shared_types::ipc::{methods, services};
use shared_types::{SubmitTransactionRequest, SubmitTransactionResponse, WireError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transport endpoint for a [`TxPoolEngine`].
pub struct TxPoolServiceServer<E: TxPoolEngine + 'static> {
    engine: Arc<E>,
}

impl<E: TxPoolEngine + 'static> TxPoolServiceServer<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: TxPoolEngine + 'static> ServiceEndpoint for TxPoolServiceServer<E> {
    fn service_name(&self) -> &'static str {
        services::TX_POOL
    }

    async fn dispatch(&self, method: &str, payload: &[u8]) -> Result<Vec<u8>, TransportFault> {
        debug!(method = method, bytes = payload.len(), "TxPool request");

        match method {
            methods::SUBMIT_TRANSACTION => {
                let req: SubmitTransactionRequest = decode_request(payload)?;
                let response = match self.engine.submit(req.tx).await {
                    Ok(result) => SubmitTransactionResponse {
                        error: WireError::success(),
                        result: Some(result),
                    },
                    Err(e) => {
                        warn!(method = method, code = e.code, error = %e.message, "Pool call failed");
                        SubmitTransactionResponse {
                            error: e.into(),
                            result: None,
                        }
                    }
                };
                encode_response(&response)
            }
            _ => Err(TransportFault::UnknownMethod {
                service: services::TX_POOL.to_string(),
                method: method.to_string(),
            }),
        }
    }
}
