//! Single-node transaction pool.
//!
//! Keeps accepted transactions in arrival order until a sealer takes them,
//! rejecting empty payloads, duplicates by hash, and submissions beyond the
//! pool's capacity. When attached to consensus, every admission reports the
//! new unsealed count through `note_unsealed_txs_size`.

use crate::ports::TxPoolEngine;
use async_trait::async_trait;
use parking_lot::Mutex;
use qc_08_consensus_service::PbftServiceClient;
use sha3::{Digest, Keccak256};
use shared_types::{ServiceError, TransactionSubmitResult};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

/// Empty transaction payload.
pub const INVALID_TRANSACTION: i32 = 4001;
/// A transaction with the same hash is already pending.
pub const DUPLICATE_TRANSACTION: i32 = 4002;
/// The pool holds `capacity` unsealed transactions already.
pub const TX_POOL_FULL: i32 = 4003;

pub const DEFAULT_TX_POOL_CAPACITY: usize = 4096;

#[derive(Debug, Default)]
struct Pending {
    order: VecDeque<(Vec<u8>, Vec<u8>)>,
    hashes: HashSet<Vec<u8>>,
}

/// In-process pool with a fixed capacity.
pub struct StandaloneTxPool {
    pending: Mutex<Pending>,
    capacity: usize,
    consensus: Option<PbftServiceClient>,
}

impl StandaloneTxPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
            capacity,
            consensus: None,
        }
    }

    /// Report the unsealed count to consensus after every admission.
    pub fn with_consensus(mut self, consensus: PbftServiceClient) -> Self {
        self.consensus = Some(consensus);
        self
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().order.len()
    }

    pub fn contains(&self, tx_hash: &[u8]) -> bool {
        self.pending.lock().hashes.contains(tx_hash)
    }

    /// Remove up to `max` transactions, oldest first, for a proposal.
    pub fn seal(&self, max: usize) -> Vec<Vec<u8>> {
        let mut pending = self.pending.lock();
        let take = max.min(pending.order.len());
        let sealed: Vec<(Vec<u8>, Vec<u8>)> = pending.order.drain(..take).collect();
        for (hash, _) in &sealed {
            pending.hashes.remove(hash);
        }
        debug!(sealed = sealed.len(), remaining = pending.order.len(), "Sealed transactions");
        sealed.into_iter().map(|(_, tx)| tx).collect()
    }

    fn admit(&self, tx: Vec<u8>) -> Result<(Vec<u8>, usize), ServiceError> {
        if tx.is_empty() {
            return Err(ServiceError::new(INVALID_TRANSACTION, "empty transaction"));
        }
        let tx_hash = Keccak256::digest(&tx).to_vec();

        let mut pending = self.pending.lock();
        if pending.hashes.contains(&tx_hash) {
            return Err(ServiceError::new(DUPLICATE_TRANSACTION, "transaction already pending"));
        }
        if pending.order.len() >= self.capacity {
            return Err(ServiceError::new(
                TX_POOL_FULL,
                format!("pool holds {} transactions", self.capacity),
            ));
        }
        pending.hashes.insert(tx_hash.clone());
        pending.order.push_back((tx_hash.clone(), tx));
        Ok((tx_hash, pending.order.len()))
    }
}

impl Default for StandaloneTxPool {
    fn default() -> Self {
        Self::new(DEFAULT_TX_POOL_CAPACITY)
    }
}

#[async_trait]
impl TxPoolEngine for StandaloneTxPool {
    async fn submit(&self, tx: Vec<u8>) -> Result<TransactionSubmitResult, ServiceError> {
        let bytes = tx.len();
        let (tx_hash, unsealed) = self.admit(tx).inspect_err(|e| {
            warn!(code = e.code, error = %e.message, bytes = bytes, "Rejected transaction");
        })?;
        debug!(bytes = bytes, unsealed = unsealed, "Transaction accepted");

        if let Some(consensus) = &self.consensus {
            consensus.note_unsealed_txs_size(unsealed as u64, move |error| {
                if let Some(e) = error {
                    warn!(code = e.code, error = %e.message, "Unsealed size report failed");
                }
            });
        }

        Ok(TransactionSubmitResult {
            tx_hash,
            block_hash: Vec::new(),
            block_number: -1,
            transaction_index: -1,
            status: 0,
        })
    }
}
