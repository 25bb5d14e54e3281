//! Named relations between two tables of a dataset

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::table::DataTable;
use crate::value::Value;

/// A named parent/child link between two tables
///
/// A child row is linked to the parent row whose `parent_columns` values equal the
/// child's `child_columns` values, position by position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataRelation {
    pub name: String,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
    pub child_table: String,
    pub child_columns: Vec<String>,
}

impl DataRelation {
    /// Create a single-column relation
    pub fn new(
        name: impl Into<String>,
        parent_table: impl Into<String>,
        parent_column: impl Into<String>,
        child_table: impl Into<String>,
        child_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent_table: parent_table.into(),
            parent_columns: vec![parent_column.into()],
            child_table: child_table.into(),
            child_columns: vec![child_column.into()],
        }
    }

    /// Create a relation over a composite key
    pub fn with_columns(
        name: impl Into<String>,
        parent_table: impl Into<String>,
        parent_columns: Vec<String>,
        child_table: impl Into<String>,
        child_columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent_table: parent_table.into(),
            parent_columns,
            child_table: child_table.into(),
            child_columns,
        }
    }
}

/// Resolved columns of a relation and the row links they produce
///
/// Tables are immutable once added to a dataset, so the parent of every child row
/// and the children of every parent row are computed once when the relation is added.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelationKeys {
    pub parent_table: usize,
    pub child_table: usize,
    parent_of: Vec<Option<usize>>,
    children_of: Vec<Vec<usize>>,
}

impl RelationKeys {
    pub fn link(
        tables: &[DataTable],
        parent_table: usize,
        parent_columns: &[usize],
        child_table: usize,
        child_columns: &[usize],
    ) -> Self {
        let parents = &tables[parent_table];
        let children = &tables[child_table];

        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for row in 0..parents.row_count() {
            if let Some(key) = key_of(parents, row, parent_columns) {
                index.entry(fingerprint(&key)).or_default().push(row);
            }
        }

        let mut parent_of = vec![None; children.row_count()];
        let mut children_of = vec![Vec::new(); parents.row_count()];
        for row in 0..children.row_count() {
            let Some(key) = key_of(children, row, child_columns) else {
                continue;
            };
            let Some(candidates) = index.get(&fingerprint(&key)) else {
                continue;
            };
            for &parent in candidates {
                if key_of(parents, parent, parent_columns).as_ref() == Some(&key) {
                    parent_of[row].get_or_insert(parent);
                    children_of[parent].push(row);
                }
            }
        }

        Self {
            parent_table,
            child_table,
            parent_of,
            children_of,
        }
    }

    /// Parent row index of a child row
    pub fn parent_of(&self, child_row: usize) -> Option<usize> {
        self.parent_of.get(child_row).copied().flatten()
    }

    /// Child row indices of a parent row, in child table order
    pub fn children_of(&self, parent_row: usize) -> &[usize] {
        self.children_of.get(parent_row).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Key values of a row, `None` when any part is null or missing
fn key_of<'a>(table: &'a DataTable, row: usize, columns: &[usize]) -> Option<Vec<&'a Value>> {
    columns
        .iter()
        .map(|&column| table.value(row, column).filter(|v| !v.is_null()))
        .collect()
}

/// Hash bucket of a key; candidates are confirmed with `==`
fn fingerprint(key: &[&Value]) -> String {
    key.iter()
        .map(|value| match value {
            // 0.0 and -0.0 compare equal
            Value::Float(f) if *f == 0.0 => "Float(0.0)".to_string(),
            other => format!("{:?}", other),
        })
        .collect::<Vec<_>>()
        .join("\u{1f}")
}
