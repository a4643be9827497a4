//! # Shared Types Crate
//!
//! Domain entities, the error channel and the remote call payloads shared by
//! every service adapter of the node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-service types are defined here.
//! - **Code, not presence**: A response's `WireError` code decides success.
//!   Code `0` is success, anything else is a failure.
//! - **Opaque bodies**: Blocks and consensus messages are carried as bytes;
//!   their codecs live outside the adapters.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use entities::*;
pub use envelope::{decode_payload, encode_payload, RemoteRequest, RemoteResponse};
pub use errors::*;
pub use ipc::*;
