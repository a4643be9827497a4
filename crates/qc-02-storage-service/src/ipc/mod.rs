//! # IPC Module
//!
//! Remote surface of the storage service.
//!
//! - `server`: [`StorageServiceServer`], the endpoint the transport dispatches to
//! - `client`: [`StorageServiceClient`], outbound calls through the completion bridge

pub mod client;
pub mod server;

pub use client::StorageServiceClient;
pub use server::StorageServiceServer;
