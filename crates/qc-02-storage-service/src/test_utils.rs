//! Test helpers shared by the service and IPC tests.

use shared_types::{Entry, TableInfo, TableMutationSet};

/// `t_test(id PRIMARY KEY, value)`.
pub fn make_test_table() -> TableInfo {
    TableInfo::new("t_test", "id", vec!["value".into()])
}

/// Live version-0 row whose `value` column holds `value`.
pub fn row(value: &str) -> Entry {
    Entry::new(0).with_field("value", value.as_bytes().to_vec())
}

/// One mutation set for `table` with a live row per `(key, value)`.
pub fn staged_block(table: &TableInfo, rows: &[(&str, &str)]) -> Vec<TableMutationSet> {
    let set = rows
        .iter()
        .fold(TableMutationSet::new(table.clone()), |set, (key, value)| {
            set.with_row(*key, row(value))
        });
    vec![set]
}
