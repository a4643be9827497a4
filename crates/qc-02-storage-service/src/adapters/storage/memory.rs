use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

/// In-memory key-value store.
///
/// Batches are applied under one write lock with an undo log, so a failure
/// part-way through restores every key it touched. Used by the `memory`
/// storage backend and by tests, which can inject a failure at a chosen
/// operation of the next batch.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Fail the next batch at this operation index.
    fail_at: Mutex<Option<usize>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next batch fail after applying `applied` operations.
    pub fn fail_next_batch_after(&self, applied: usize) {
        *self.fail_at.lock() = Some(applied);
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, KVStoreError> {
        let data = self.data.read();
        Ok(keys.iter().map(|key| data.get(key).cloned()).collect())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let fail_at = self.fail_at.lock().take();
        let mut data = self.data.write();
        let mut undo: Vec<(Vec<u8>, Option<Vec<u8>>)> = Vec::with_capacity(operations.len());

        for (index, op) in operations.into_iter().enumerate() {
            if fail_at == Some(index) {
                for (key, previous) in undo.into_iter().rev() {
                    match previous {
                        Some(value) => data.insert(key, value),
                        None => data.remove(&key),
                    };
                }
                return Err(KVStoreError::IOError {
                    message: format!("injected failure at batch operation {index}"),
                });
            }

            match op {
                BatchOperation::Put { key, value } => {
                    let previous = data.insert(key.clone(), value);
                    undo.push((key, previous));
                }
                BatchOperation::Delete { key } => {
                    let previous = data.remove(&key);
                    undo.push((key, previous));
                }
            }
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.read().contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        let data = self.data.read();
        let results = data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }
}
