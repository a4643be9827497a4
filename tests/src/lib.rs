//! # Ledger Service Adapter Test Suite
//!
//! Unified test crate for flows that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── commit_flow.rs        # stage → commit → batch read over the transport
//!     ├── completion_bridge.rs  # exactly-once resolution on every path
//!     └── node_runtime.rs       # the wired node end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By flow
//! cargo test -p qc-tests integration::commit_flow::
//! ```

pub mod integration;
