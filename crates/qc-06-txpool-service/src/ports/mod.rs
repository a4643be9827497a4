//! Ports for the transaction pool adapter.
//!
//! - `outbound`: the pool engine the server endpoint forwards to

pub mod outbound;

pub use outbound::TxPoolEngine;
