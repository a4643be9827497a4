use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-backed key-value store.
///
/// Keeps the whole map in memory and rewrites the data file on every batch:
/// the new image is written to a temporary file, synced, and renamed over
/// the old one, so a crash leaves either the old or the new image. The image
/// ends with a CRC32 of its records and is rejected on load if it does not
/// match.
///
/// File format: `[key_len:u32][key][value_len:u32][value]... [crc32:u32]`
pub struct FileBackedKVStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading any existing image.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = decode_image(&bytes)?;
                info!(path = %path.display(), keys = data.len(), bytes = bytes.len(), "Loaded storage file");
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No existing storage file");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            data: RwLock::new(data),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = encode_image(data);
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), keys = data.len(), "Persisted storage file");
        Ok(())
    }
}

fn encode_image(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (key, value) in data {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    let checksum = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&checksum.to_le_bytes());
    bytes
}

fn decode_image(bytes: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
    let corrupt = |message: &str| KVStoreError::CorruptionError {
        message: message.to_string(),
    };

    if bytes.len() < 4 {
        return Err(corrupt("storage file shorter than its checksum"));
    }
    let (records, trailer) = bytes.split_at(bytes.len() - 4);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if crc32fast::hash(records) != expected {
        return Err(corrupt("storage file checksum mismatch"));
    }

    let mut data = BTreeMap::new();
    let mut cursor = 0;
    while cursor < records.len() {
        let key = read_chunk(records, &mut cursor).ok_or_else(|| corrupt("truncated key"))?;
        let value = read_chunk(records, &mut cursor).ok_or_else(|| corrupt("truncated value"))?;
        data.insert(key, value);
    }
    Ok(data)
}

fn read_chunk(bytes: &[u8], cursor: &mut usize) -> Option<Vec<u8>> {
    let len_end = cursor.checked_add(4)?;
    let len = u32::from_le_bytes(bytes.get(*cursor..len_end)?.try_into().ok()?) as usize;
    let end = len_end.checked_add(len)?;
    let chunk = bytes.get(len_end..end)?.to_vec();
    *cursor = end;
    Some(chunk)
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn multi_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, KVStoreError> {
        let data = self.data.read();
        Ok(keys.iter().map(|key| data.get(key).cloned()).collect())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut data = self.data.write();

        // Apply to a copy; the live map only changes once the image is durable.
        let mut next = data.clone();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    next.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    next.remove(&key);
                }
            }
        }

        self.save(&next)?;
        *data = next;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");

        {
            let store = FileBackedKVStore::open(&path).unwrap();
            store
                .atomic_batch_write(vec![
                    BatchOperation::put(b"a".to_vec(), b"1".to_vec()),
                    BatchOperation::put(b"b".to_vec(), Vec::new()),
                ])
                .unwrap();
            store.atomic_batch_write(vec![BatchOperation::delete(b"a".to_vec())]).unwrap();
        }

        let reopened = FileBackedKVStore::open(&path).unwrap();
        assert_eq!(reopened.get(b"a").unwrap(), None);
        assert_eq!(reopened.get(b"b").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBackedKVStore::open(dir.path().join("absent.db")).unwrap();
        assert!(store.prefix_scan(b"").unwrap().is_empty());
    }

    #[test]
    fn test_corruption_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.db");
        {
            let store = FileBackedKVStore::open(&path).unwrap();
            store
                .atomic_batch_write(vec![BatchOperation::put(b"key".to_vec(), b"value".to_vec())])
                .unwrap();
        }

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[5] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            FileBackedKVStore::open(&path),
            Err(KVStoreError::CorruptionError { .. })
        ));
    }

    #[test]
    fn test_failed_save_leaves_map_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the data file should be makes the rename fail.
        let path = dir.path().join("blocked");
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let store = FileBackedKVStore {
            data: RwLock::new(BTreeMap::new()),
            path,
        };
        let result = store.atomic_batch_write(vec![BatchOperation::put(b"a".to_vec(), b"1".to_vec())]);
        assert!(result.is_err());
        assert_eq!(store.get(b"a").unwrap(), None);
    }
}
