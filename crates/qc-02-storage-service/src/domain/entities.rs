//! # Domain Entities
//!
//! Entities owned by the Storage Service itself. Cross-boundary types
//! (`TableInfo`, `Entry`, `TableMutationSet`) live in `shared-types`.

use shared_types::{BlockNumber, TableMutationSet};
use std::time::{Duration, Instant};

/// Mutations staged for one not-yet-committed block.
#[derive(Debug, Clone)]
pub struct StateCacheEntry {
    pub block_number: BlockNumber,
    pub mutations: Vec<TableMutationSet>,
    /// When the entry was staged (diagnostics only).
    pub staged_at: Instant,
}

impl StateCacheEntry {
    pub fn new(block_number: BlockNumber, mutations: Vec<TableMutationSet>) -> Self {
        Self {
            block_number,
            mutations,
            staged_at: Instant::now(),
        }
    }

    /// Total rows across every staged table.
    pub fn row_count(&self) -> usize {
        self.mutations.iter().map(TableMutationSet::len).sum()
    }

    pub fn age(&self) -> Duration {
        self.staged_at.elapsed()
    }
}
