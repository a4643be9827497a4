//! # IPC Module
//!
//! - `client`: [`PbftServiceClient`] and [`BlockSyncServiceClient`], outbound
//!   calls through the completion bridge
//! - `server`: endpoints forwarding to the engine ports

pub mod client;
pub mod server;

pub use client::{BlockSyncServiceClient, PbftServiceClient};
pub use server::{BlockSyncServiceServer, PbftServiceServer};
