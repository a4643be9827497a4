//! # State Cache Store
//!
//! Staged, not-yet-committed mutations keyed by block number.
//!
//! ## Concurrency
//!
//! Each block number owns a slot guarded by its own mutex inside a sharded
//! map. Operations on distinct numbers run concurrently; operations on the
//! same number are serialized. A slot that ends an operation empty and
//! unreferenced is removed from the map.
//!
//! ## Capacity
//!
//! At most `max_staged_blocks` numbers hold an entry at once. Staging a new
//! number beyond that fails; replacing an existing entry never does.

use crate::domain::entities::StateCacheEntry;
use crate::domain::errors::StorageError;
use dashmap::DashMap;
use parking_lot::Mutex;
use shared_types::{BlockNumber, TableMutationSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

type Slot = Arc<Mutex<Option<StateCacheEntry>>>;

pub struct StateCacheStore {
    slots: DashMap<BlockNumber, Slot>,
    /// Number of slots currently holding an entry.
    staged: AtomicUsize,
    max_staged_blocks: usize,
}

impl StateCacheStore {
    pub fn new(max_staged_blocks: usize) -> Self {
        Self {
            slots: DashMap::new(),
            staged: AtomicUsize::new(0),
            max_staged_blocks,
        }
    }

    /// Stage `mutations` for `block_number`, replacing any prior entry.
    pub fn stage(
        &self,
        block_number: BlockNumber,
        mutations: Vec<TableMutationSet>,
    ) -> Result<(), StorageError> {
        self.with_slot(block_number, |slot| {
            if slot.is_none() {
                self.reserve()?;
            }
            let replaced = slot.replace(StateCacheEntry::new(block_number, mutations));
            debug!(
                block_number = block_number,
                replaced = replaced.is_some(),
                "Staged state cache"
            );
            Ok(())
        })
    }

    /// Remove the entry for `block_number`. Returns whether one existed.
    pub fn drop_entry(&self, block_number: BlockNumber) -> bool {
        self.with_slot(block_number, |slot| self.release(slot.take()).is_some())
    }

    /// Copy of the staged mutation sets for `block_number`.
    pub fn get(&self, block_number: BlockNumber) -> Result<Vec<TableMutationSet>, StorageError> {
        self.with_slot(block_number, |slot| {
            slot.as_ref()
                .map(|entry| entry.mutations.clone())
                .ok_or(StorageError::StateCacheNotFound { block_number })
        })
    }

    /// Run `commit` while holding the slot for `block_number`, and evict the
    /// entry if it succeeds.
    ///
    /// A concurrent `stage` of the same number is ordered strictly before or
    /// after the whole commit.
    pub fn consume_with<R, F>(&self, block_number: BlockNumber, commit: F) -> Result<R, StorageError>
    where
        F: FnOnce(Option<&StateCacheEntry>) -> Result<R, StorageError>,
    {
        self.with_slot(block_number, |slot| {
            let result = commit(slot.as_ref())?;
            if self.release(slot.take()).is_some() {
                debug!(block_number = block_number, "Evicted committed state cache");
            }
            Ok(result)
        })
    }

    /// Drop every entry at or below `head`. Such entries can never commit.
    /// Returns how many were evicted.
    pub fn evict_through(&self, head: BlockNumber) -> usize {
        let stale: Vec<BlockNumber> = self
            .slots
            .iter()
            .map(|entry| *entry.key())
            .filter(|number| *number <= head)
            .collect();
        let evicted = stale
            .into_iter()
            .filter(|number| self.drop_entry(*number))
            .count();
        if evicted > 0 {
            debug!(head = head, evicted = evicted, "Evicted stale state cache");
        }
        evicted
    }

    pub fn contains(&self, block_number: BlockNumber) -> bool {
        self.slots
            .get(&block_number)
            .map(|slot| Arc::clone(slot.value()))
            .is_some_and(|slot| slot.lock().is_some())
    }

    /// Sorted block numbers that currently hold an entry.
    pub fn staged_block_numbers(&self) -> Vec<BlockNumber> {
        let slots: Vec<(BlockNumber, Slot)> = self
            .slots
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        let mut numbers: Vec<BlockNumber> = slots
            .into_iter()
            .filter(|(_, slot)| slot.lock().is_some())
            .map(|(number, _)| number)
            .collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn len(&self) -> usize {
        self.staged.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_staged_blocks
    }

    fn reserve(&self) -> Result<(), StorageError> {
        let max = self.max_staged_blocks;
        self.staged
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .map(|_| ())
            .map_err(|_| StorageError::StagingCapacityExceeded { capacity: max })
    }

    fn release(&self, removed: Option<StateCacheEntry>) -> Option<StateCacheEntry> {
        if removed.is_some() {
            self.staged.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    fn with_slot<R>(&self, block_number: BlockNumber, f: impl FnOnce(&mut Option<StateCacheEntry>) -> R) -> R {
        // Clone the Arc so the shard lock is released before the slot is locked.
        let slot = Arc::clone(self.slots.entry(block_number).or_default().value());
        let result = {
            let mut guard = slot.lock();
            f(&mut *guard)
        };
        self.reclaim(block_number, &slot);
        result
    }

    /// Drop an empty slot nobody else holds. The strong count is stable here:
    /// new references are only handed out under the shard lock we hold.
    fn reclaim(&self, block_number: BlockNumber, slot: &Slot) {
        self.slots.remove_if(&block_number, |_, current| {
            Arc::ptr_eq(current, slot)
                && Arc::strong_count(current) == 2
                && current.try_lock().is_some_and(|guard| guard.is_none())
        });
    }
}
