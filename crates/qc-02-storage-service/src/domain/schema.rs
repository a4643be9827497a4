//! # Schema Registry
//!
//! Registered table descriptors. Mutations are checked against them before
//! they are staged or committed: the table must exist, the descriptor must
//! match the registered one, and every row may only set declared columns.

use crate::domain::errors::StorageError;
use crate::domain::value_objects::KeyPrefix;
use parking_lot::RwLock;
use shared_types::{Entry, TableInfo, TableMutationSet};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Outcome of registering a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    /// An identical descriptor was already registered.
    AlreadyExists,
}

#[derive(Default)]
pub struct SchemaRegistry {
    tables: RwLock<HashMap<String, TableInfo>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `info` may be registered, without registering it.
    pub fn check(&self, info: &TableInfo) -> Result<Registration, StorageError> {
        classify(&self.tables.read(), info)
    }

    /// Register `info`. Idempotent for an identical descriptor.
    pub fn register(&self, info: TableInfo) -> Result<Registration, StorageError> {
        let mut tables = self.tables.write();
        let outcome = classify(&tables, &info)?;
        if outcome == Registration::Created {
            tables.insert(info.name.clone(), info);
        }
        Ok(outcome)
    }

    pub fn get(&self, name: &str) -> Option<TableInfo> {
        self.tables.read().get(name).cloned()
    }

    /// Registered descriptor for a read, or `TableNotFound`.
    pub fn resolve(&self, name: &str) -> Result<TableInfo, StorageError> {
        self.get(name).ok_or_else(|| StorageError::TableNotFound {
            table: name.to_string(),
        })
    }

    /// Like [`SchemaRegistry::resolve`], but the caller's descriptor must also
    /// match the registered one.
    pub fn resolve_descriptor(&self, info: &TableInfo) -> Result<TableInfo, StorageError> {
        let registered = self.resolve(&info.name)?;
        if registered != *info {
            return Err(StorageError::TableInfoMismatch {
                table: info.name.clone(),
            });
        }
        Ok(registered)
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Validate rows destined for `info`.
    pub fn validate_rows(
        &self,
        info: &TableInfo,
        rows: &BTreeMap<String, Entry>,
    ) -> Result<(), StorageError> {
        let tables = self.tables.read();
        let registered = tables
            .get(&info.name)
            .ok_or_else(|| StorageError::UnknownTable {
                table: info.name.clone(),
            })?;

        if registered != info {
            return Err(StorageError::TableInfoMismatch {
                table: info.name.clone(),
            });
        }

        for entry in rows.values() {
            if let Some(column) = entry.fields.keys().find(|c| !registered.has_field(c)) {
                return Err(StorageError::UnknownColumn {
                    table: info.name.clone(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn validate(&self, set: &TableMutationSet) -> Result<(), StorageError> {
        self.validate_rows(&set.table_info, &set.rows)
    }

    /// Validate every set of one block. Each table may appear only once.
    pub fn validate_block<'a, I>(&self, sets: I) -> Result<(), StorageError>
    where
        I: IntoIterator<Item = (&'a TableInfo, &'a BTreeMap<String, Entry>)>,
    {
        let mut seen = HashSet::new();
        for (info, rows) in sets {
            if !seen.insert(info.name.as_str()) {
                return Err(StorageError::DuplicateTable {
                    table: info.name.clone(),
                });
            }
            self.validate_rows(info, rows)?;
        }
        Ok(())
    }
}

fn classify(tables: &HashMap<String, TableInfo>, info: &TableInfo) -> Result<Registration, StorageError> {
    if !KeyPrefix::is_valid_table_name(&info.name) {
        return Err(StorageError::InvalidTableName {
            table: info.name.clone(),
        });
    }
    match tables.get(&info.name) {
        Some(existing) if existing == info => Ok(Registration::AlreadyExists),
        Some(_) => Err(StorageError::TableConflict {
            table: info.name.clone(),
        }),
        None => Ok(Registration::Created),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t_test() -> TableInfo {
        TableInfo::new("t_test", "id", vec!["v".into()])
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = SchemaRegistry::new();
        assert_eq!(registry.register(t_test()).unwrap(), Registration::Created);
        assert_eq!(registry.register(t_test()).unwrap(), Registration::AlreadyExists);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_descriptor_rejected() {
        let registry = SchemaRegistry::new();
        registry.register(t_test()).unwrap();
        let other = TableInfo::new("t_test", "id", vec!["w".into()]);
        assert!(matches!(
            registry.register(other),
            Err(StorageError::TableConflict { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_undeclared_column() {
        let registry = SchemaRegistry::new();
        registry.register(t_test()).unwrap();

        let good = TableMutationSet::new(t_test()).with_row("k1", Entry::new(1).with_field("v", b"1".to_vec()));
        assert!(registry.validate(&good).is_ok());

        let bad = TableMutationSet::new(t_test()).with_row("k1", Entry::new(1).with_field("x", b"1".to_vec()));
        assert_eq!(
            registry.validate(&bad),
            Err(StorageError::UnknownColumn {
                table: "t_test".into(),
                column: "x".into()
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_and_mismatched_tables() {
        let registry = SchemaRegistry::new();
        let unknown = TableMutationSet::new(t_test());
        assert!(matches!(
            registry.validate(&unknown),
            Err(StorageError::UnknownTable { .. })
        ));

        registry.register(t_test()).unwrap();
        let mismatched = TableMutationSet::new(TableInfo::new("t_test", "pk", vec!["v".into()]));
        assert!(matches!(
            registry.validate(&mismatched),
            Err(StorageError::TableInfoMismatch { .. })
        ));
    }

    #[test]
    fn test_block_rejects_repeated_table() {
        let registry = SchemaRegistry::new();
        registry.register(t_test()).unwrap();
        let set = TableMutationSet::new(t_test()).with_row("k1", Entry::new(1).with_field("v", b"1".to_vec()));

        assert!(registry.validate_block([(&set.table_info, &set.rows)]).is_ok());
        assert_eq!(
            registry.validate_block([(&set.table_info, &set.rows), (&set.table_info, &set.rows)]),
            Err(StorageError::DuplicateTable { table: "t_test".into() })
        );
    }

    #[test]
    fn test_resolve_descriptor_requires_exact_match() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.resolve_descriptor(&t_test()),
            Err(StorageError::TableNotFound { .. })
        ));

        registry.register(t_test()).unwrap();
        assert_eq!(registry.resolve_descriptor(&t_test()).unwrap(), t_test());
        let wider = TableInfo::new("t_test", "id", vec!["v".into(), "w".into()]);
        assert!(matches!(
            registry.resolve_descriptor(&wider),
            Err(StorageError::TableInfoMismatch { .. })
        ));
    }

    #[test]
    fn test_tombstones_pass_validation() {
        let registry = SchemaRegistry::new();
        registry.register(t_test()).unwrap();
        let set = TableMutationSet::new(t_test()).with_row("k1", Entry::tombstone(2));
        assert!(registry.validate(&set).is_ok());
    }
}
