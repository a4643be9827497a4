//! # Ports Layer
//!
//! - `inbound` - API exposed by the service (driving port)
//! - `outbound` - Key-value store required by the service (driven port)

pub mod inbound;
pub mod outbound;
