//! # Core Domain Entities
//!
//! Types that cross the remote-procedure boundary between the node's service
//! adapters.
//!
//! ## Clusters
//!
//! - **Tables**: `TableInfo`, `Entry`, `EntryStatus`, `TableMutationSet`, `Condition`
//! - **Chain**: `Block`, `LedgerConfig`, `NodeId`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// Block number as carried on the wire (signed 64-bit).
pub type BlockNumber = i64;

/// Consensus view number.
pub type ViewNumber = i64;

/// Opaque column value.
pub type FieldValue = Vec<u8>;

/// Identifier of a consensus node (its public key bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub Vec<u8>);

impl NodeId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Abbreviated: node ids are long public keys.
        let shown = self.0.len().min(8);
        write!(f, "{}", hex::encode(&self.0[..shown]))
    }
}

// =============================================================================
// CLUSTER B: TABLES
// =============================================================================

/// Describes a table: its name, primary-key column and ordered value columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name (also used as the column family for raw reads).
    pub name: String,
    /// Name of the primary-key column.
    pub key: String,
    /// Ordered value column names.
    pub fields: Vec<String>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, key: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            fields,
        }
    }

    /// Whether `column` is one of the declared value columns.
    pub fn has_field(&self, column: &str) -> bool {
        self.fields.iter().any(|f| f == column)
    }

    /// The first declared value column, used by raw `get`/`put`.
    pub fn value_column(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }
}

/// Live/tombstone tag of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EntryStatus {
    /// Live row.
    #[default]
    Normal,
    /// Tombstone: applying it removes the key.
    Deleted,
}

/// A versioned row value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Entry {
    /// Column name to opaque value.
    pub fields: BTreeMap<String, FieldValue>,
    /// Version assigned by the table factory that produced the row.
    pub version: u64,
    /// Live or tombstone.
    pub status: EntryStatus,
}

impl Entry {
    pub fn new(version: u64) -> Self {
        Self {
            fields: BTreeMap::new(),
            version,
            status: EntryStatus::Normal,
        }
    }

    /// Build a tombstone for the given version.
    pub fn tombstone(version: u64) -> Self {
        Self {
            fields: BTreeMap::new(),
            version,
            status: EntryStatus::Deleted,
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set_field(column, value);
        self
    }

    pub fn set_field(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn get_field(&self, column: &str) -> Option<&[u8]> {
        self.fields.get(column).map(Vec::as_slice)
    }

    pub fn is_deleted(&self) -> bool {
        self.status == EntryStatus::Deleted
    }
}

/// A table plus the rows to upsert or delete in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMutationSet {
    /// The table the rows belong to.
    pub table_info: TableInfo,
    /// Primary key to row.
    pub rows: BTreeMap<String, Entry>,
}

impl TableMutationSet {
    pub fn new(table_info: TableInfo) -> Self {
        Self {
            table_info,
            rows: BTreeMap::new(),
        }
    }

    pub fn with_row(mut self, key: impl Into<String>, entry: Entry) -> Self {
        self.rows.insert(key.into(), entry);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Comparison applied to a primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// Primary-key filter accepted by `get_primary_keys`.
///
/// Keys are compared lexicographically. An empty condition matches every key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Condition {
    /// All constraints must hold.
    pub constraints: Vec<(Comparator, String)>,
    /// Optional `(offset, count)` window applied after filtering.
    pub limit: Option<(usize, usize)>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, value: impl Into<String>) -> Self {
        self.with(Comparator::Eq, value)
    }

    pub fn ne(self, value: impl Into<String>) -> Self {
        self.with(Comparator::Ne, value)
    }

    pub fn gt(self, value: impl Into<String>) -> Self {
        self.with(Comparator::Gt, value)
    }

    pub fn ge(self, value: impl Into<String>) -> Self {
        self.with(Comparator::Ge, value)
    }

    pub fn lt(self, value: impl Into<String>) -> Self {
        self.with(Comparator::Lt, value)
    }

    pub fn le(self, value: impl Into<String>) -> Self {
        self.with(Comparator::Le, value)
    }

    pub fn limit(mut self, offset: usize, count: usize) -> Self {
        self.limit = Some((offset, count));
        self
    }

    fn with(mut self, cmp: Comparator, value: impl Into<String>) -> Self {
        self.constraints.push((cmp, value.into()));
        self
    }

    /// Whether `key` satisfies every constraint.
    pub fn matches(&self, key: &str) -> bool {
        self.constraints.iter().all(|(cmp, value)| {
            let value = value.as_str();
            match cmp {
                Comparator::Eq => key == value,
                Comparator::Ne => key != value,
                Comparator::Gt => key > value,
                Comparator::Ge => key >= value,
                Comparator::Lt => key < value,
                Comparator::Le => key <= value,
            }
        })
    }

    /// Filter `keys` (already sorted) and apply the limit window.
    pub fn apply<I>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        let matching = keys.into_iter().filter(|k| self.matches(k));
        match self.limit {
            Some((offset, count)) => matching.skip(offset).take(count).collect(),
            None => matching.collect(),
        }
    }
}

// =============================================================================
// CLUSTER C: CHAIN
// =============================================================================

/// An encoded block as handed between sync and consensus.
///
/// The block codec is owned by the protocol layer; adapters only carry the
/// header fields they log and the opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub number: BlockNumber,
    pub hash: Vec<u8>,
    pub parent_hash: Vec<u8>,
    pub transaction_hashes: Vec<Vec<u8>>,
    /// Encoded block body.
    pub payload: Vec<u8>,
}

/// Ledger parameters delivered to consensus when a block is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    pub block_number: BlockNumber,
    pub block_hash: Vec<u8>,
    pub sealer_list: Vec<NodeId>,
    pub consensus_timeout_ms: u64,
    pub block_tx_count_limit: u64,
    pub leader_switch_period: u64,
}
