//! # Adapters Module
//!
//! - `standalone`: in-process pool for a single-node deployment

pub mod standalone;

pub use standalone::{
    StandaloneTxPool, DEFAULT_TX_POOL_CAPACITY, DUPLICATE_TRANSACTION, INVALID_TRANSACTION,
    TX_POOL_FULL,
};
