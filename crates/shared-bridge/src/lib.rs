//! # Shared Bridge - Completion Bridge for Outbound Remote Calls
//!
//! Every service adapter of the node calls its peers through this crate.
//!
//! ## Contract
//!
//! - **One handler, one invocation:** each call supplies a completion handler
//!   `(Option<ServiceError>, T)` that runs exactly once, on success, on a
//!   remote-reported failure, on a transport fault, or when the call is
//!   abandoned.
//! - **Sentinels on failure:** a failed call delivers the caller-chosen
//!   sentinel in place of the result.
//! - **No blocking:** issuing a call only spawns a task.
//!
//! ```text
//! ┌──────────────┐  call()   ┌──────────────────┐  invoke()  ┌─────────────────┐
//! │ Client       │ ────────▶ │ CompletionBridge │ ─────────▶ │ RemoteTransport │
//! │ adapter      │           │ + registry       │            └────────┬────────┘
//! │              │ ◀──────── │                  │ ◀──────────────────┘
//! └──────────────┘ handler() └──────────────────┘   response / fault
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bridge;
pub mod correlation;
pub mod memory;
pub mod pending;
pub mod transport;

// Re-export main types
pub use bridge::CompletionBridge;
pub use correlation::CorrelationId;
pub use memory::InMemoryTransport;
pub use pending::{BridgeStatsSnapshot, CallOutcome, PendingCall, PendingCallRegistry};
pub use transport::{
    decode_request, encode_response, RemoteTransport, ServiceEndpoint, TransportFault,
};

/// Default per-call timeout applied by the runtime's transport.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;
