//! # qc-06-txpool-service
//!
//! Remote adapter for the node's transaction pool (`TxPoolService`).
//!
//! ```text
//! rpc / test clients                                txpool node
//! ┌───────────────────┐    CompletionBridge     ┌───────────────────┐
//! │ TxPoolService-    │ ──────────────────────▶ │ TxPoolService-    │──▶ TxPoolEngine
//! │ Client::submit    │      (transport)        │ Server            │
//! │                   │ ◀────────────────────── │                   │
//! └───────────────────┘  handler(error, result) └───────────────────┘
//! ```
//!
//! `submit` never blocks. Its handler runs exactly once, with `None` in
//! place of the submit result whenever the call fails.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_06_txpool_service::TxPoolServiceClient;
//!
//! let client = TxPoolServiceClient::new(bridge);
//! client.submit(encoded_tx, |error, result| match (error, result) {
//!     (None, Some(result)) => tracing::info!(status = result.status, "accepted"),
//!     (error, _) => tracing::warn!(?error, "rejected"),
//! });
//! ```

pub mod adapters;
pub mod ipc;
pub mod ports;

pub use adapters::{StandaloneTxPool, DEFAULT_TX_POOL_CAPACITY};
pub use ipc::{TxPoolServiceClient, TxPoolServiceServer};
pub use ports::TxPoolEngine;
