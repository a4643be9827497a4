//! # TxPool Client
//!
//! Outbound adapter for a remote `TxPoolService`.
//!
//! ## Sentinels
//!
//! | Call | Sentinel |
//! |------|----------|
//! | `submit` | `None` |

use shared_bridge::{CompletionBridge, CorrelationId};
use shared_types::ipc::{methods, services};
use shared_types::{
    ServiceError, SubmitTransactionRequest, SubmitTransactionResponse, TransactionSubmitResult,
};

/// Outbound calls to `TxPoolService`.
#[derive(Clone)]
pub struct TxPoolServiceClient {
    bridge: CompletionBridge,
}

impl TxPoolServiceClient {
    pub fn new(bridge: CompletionBridge) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &CompletionBridge {
        &self.bridge
    }

    /// Submit one encoded transaction. The handler gets the submit result,
    /// or `None` with the error when the pool or the transport refuses it.
    pub fn submit<H>(&self, tx: Vec<u8>, handler: H) -> CorrelationId
    where
        H: FnOnce(Option<ServiceError>, Option<TransactionSubmitResult>) + Send + 'static,
    {
        self.bridge.call(
            services::TX_POOL,
            methods::SUBMIT_TRANSACTION,
            &SubmitTransactionRequest { tx },
            None,
            |r: SubmitTransactionResponse| r.result,
            handler,
        )
    }
}
