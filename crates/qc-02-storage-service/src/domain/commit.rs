//! # Commit Plan
//!
//! Turns validated mutation sets into the single atomic batch a commit
//! writes: live rows become puts, tombstones become deletes, and the new
//! last-committed block number rides in the same batch.

use crate::domain::errors::StorageError;
use crate::domain::value_objects::KeyPrefix;
use crate::ports::outbound::BatchOperation;
use shared_types::{BlockNumber, Entry, TableInfo};
use std::collections::BTreeMap;

/// The batch for one commit and the number of rows it applies.
#[derive(Debug)]
pub struct CommitPlan {
    pub block_number: BlockNumber,
    pub operations: Vec<BatchOperation>,
    /// Rows applied, live and tombstone alike.
    pub rows_applied: u64,
}

impl CommitPlan {
    /// Build the batch for `block_number` from `(table, rows)` pairs.
    pub fn build<'a, I>(block_number: BlockNumber, tables: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = (&'a TableInfo, &'a BTreeMap<String, Entry>)>,
    {
        let mut operations = Vec::new();
        let mut rows_applied = 0u64;

        for (info, rows) in tables {
            for (key, entry) in rows {
                let row_key = KeyPrefix::row_key(&info.name, key);
                if entry.is_deleted() {
                    operations.push(BatchOperation::delete(row_key));
                } else {
                    operations.push(BatchOperation::put(row_key, bincode::serialize(entry)?));
                }
                rows_applied += 1;
            }
        }

        operations.push(BatchOperation::put(
            KeyPrefix::last_committed_key(),
            encode_block_number(block_number),
        ));

        Ok(Self {
            block_number,
            operations,
            rows_applied,
        })
    }
}

pub fn encode_block_number(block_number: BlockNumber) -> Vec<u8> {
    block_number.to_be_bytes().to_vec()
}

pub fn decode_block_number(bytes: &[u8]) -> Result<BlockNumber, StorageError> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| StorageError::Serialization {
        message: format!("block number must be 8 bytes, got {}", bytes.len()),
    })?;
    Ok(BlockNumber::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_counts_every_row() {
        let info = TableInfo::new("t_test", "id", vec!["v".into()]);
        let mut rows = BTreeMap::new();
        rows.insert("k1".to_string(), Entry::new(1).with_field("v", b"1".to_vec()));
        rows.insert("k2".to_string(), Entry::tombstone(2));

        let plan = CommitPlan::build(10, [(&info, &rows)]).unwrap();
        assert_eq!(plan.rows_applied, 2);
        // Two rows plus the last-committed marker.
        assert_eq!(plan.operations.len(), 3);
        assert!(matches!(
            &plan.operations[1],
            BatchOperation::Delete { key } if *key == KeyPrefix::row_key("t_test", "k2")
        ));
    }

    #[test]
    fn test_empty_plan_still_advances_block_number() {
        let plan = CommitPlan::build(4, std::iter::empty()).unwrap();
        assert_eq!(plan.rows_applied, 0);
        assert_eq!(plan.operations.len(), 1);
    }

    #[test]
    fn test_block_number_encoding() {
        for n in [0, 1, -1, i64::MAX] {
            assert_eq!(decode_block_number(&encode_block_number(n)).unwrap(), n);
        }
        assert!(decode_block_number(&[1, 2, 3]).is_err());
    }
}
