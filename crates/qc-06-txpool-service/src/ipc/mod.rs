//! # IPC Module
//!
//! - `client`: [`TxPoolServiceClient`], outbound submission through the
//!   completion bridge
//! - `server`: endpoint forwarding to the pool engine

pub mod client;
pub mod server;

pub use client::TxPoolServiceClient;
pub use server::TxPoolServiceServer;
