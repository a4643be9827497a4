//! # Value Objects
//!
//! Configuration and key layout for the Storage Service.

/// Default bound on distinct staged block numbers.
pub const DEFAULT_MAX_STAGED_BLOCKS: usize = 1024;

/// Configuration for the storage service.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Maximum number of distinct block numbers staged at once (default: 1024).
    ///
    /// Staging a new number beyond this fails; re-staging a number already
    /// present always succeeds.
    pub max_staged_blocks: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_staged_blocks: DEFAULT_MAX_STAGED_BLOCKS,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staging capacity.
    pub fn with_max_staged_blocks(mut self, max: usize) -> Self {
        self.max_staged_blocks = max;
        self
    }
}

/// Key prefixes for the key-value store.
///
/// All keys are prefixed to namespace different data types.
#[derive(Debug, Clone, Copy)]
pub enum KeyPrefix {
    /// Table rows: `t:{table}\0{primary_key}` -> Entry
    Row,
    /// Table descriptors: `s:{table}` -> TableInfo
    Schema,
    /// Service metadata: `m:{name}`
    Metadata,
}

impl KeyPrefix {
    /// Separates table name from primary key in row keys.
    const TABLE_SEPARATOR: u8 = 0;

    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Row => b"t:",
            KeyPrefix::Schema => b"s:",
            KeyPrefix::Metadata => b"m:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    /// Prefix shared by every row of `table`.
    pub fn table_rows_prefix(table: &str) -> Vec<u8> {
        let mut key = KeyPrefix::Row.key(table.as_bytes());
        key.push(Self::TABLE_SEPARATOR);
        key
    }

    pub fn row_key(table: &str, primary_key: &str) -> Vec<u8> {
        let mut key = Self::table_rows_prefix(table);
        key.extend_from_slice(primary_key.as_bytes());
        key
    }

    /// Recover the primary key from a row key of `table`.
    pub fn primary_key_of(table: &str, row_key: &[u8]) -> Option<String> {
        let prefix = Self::table_rows_prefix(table);
        let suffix = row_key.strip_prefix(prefix.as_slice())?;
        String::from_utf8(suffix.to_vec()).ok()
    }

    pub fn schema_key(table: &str) -> Vec<u8> {
        KeyPrefix::Schema.key(table.as_bytes())
    }

    /// Key holding the last committed block number.
    pub fn last_committed_key() -> Vec<u8> {
        KeyPrefix::Metadata.key(b"last_committed")
    }

    /// Whether `table` can be embedded in a row key unambiguously.
    pub fn is_valid_table_name(table: &str) -> bool {
        !table.is_empty() && !table.as_bytes().contains(&Self::TABLE_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_keys_do_not_collide_across_tables() {
        // "ab" + pk "c" must not alias "a" + pk "bc".
        assert_ne!(KeyPrefix::row_key("ab", "c"), KeyPrefix::row_key("a", "bc"));
        assert!(!KeyPrefix::row_key("ab", "c").starts_with(&KeyPrefix::table_rows_prefix("a")));
    }

    #[test]
    fn test_primary_key_recovery() {
        let key = KeyPrefix::row_key("t_test", "k1");
        assert_eq!(KeyPrefix::primary_key_of("t_test", &key).as_deref(), Some("k1"));
        assert_eq!(KeyPrefix::primary_key_of("t_other", &key), None);
    }

    #[test]
    fn test_table_name_validation() {
        assert!(KeyPrefix::is_valid_table_name("t_test"));
        assert!(!KeyPrefix::is_valid_table_name(""));
        assert!(!KeyPrefix::is_valid_table_name("bad\0name"));
    }
}
