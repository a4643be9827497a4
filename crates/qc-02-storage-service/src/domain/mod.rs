//! # Domain Layer
//!
//! Pure domain logic for the Storage Service.
//!
//! ## Modules
//!
//! - `entities` - Staged state cache entries
//! - `state_cache` - Per-block-number staging store
//! - `schema` - Table descriptor registry and mutation validation
//! - `commit` - Commit batch construction
//! - `value_objects` - Configuration and key layout
//! - `errors` - Domain error types

pub mod commit;
pub mod entities;
pub mod errors;
pub mod schema;
pub mod state_cache;
pub mod value_objects;
