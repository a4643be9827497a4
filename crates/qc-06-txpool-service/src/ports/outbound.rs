//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use shared_types::{ServiceError, TransactionSubmitResult};

/// Pool engine behind `TxPoolService`.
#[async_trait]
pub trait TxPoolEngine: Send + Sync {
    /// Admit one encoded transaction.
    async fn submit(&self, tx: Vec<u8>) -> Result<TransactionSubmitResult, ServiceError>;
}
