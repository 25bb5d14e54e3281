//! Borrowed view of a single row

use std::fmt;

use super::error::{DataSetError, DataSetResult};
use super::relation::RelationKeys;
use super::table::DataTable;
use super::DataSet;
use crate::value::Value;

/// A row of a table, borrowed from its dataset
///
/// Cheap to copy; carries the dataset so relations can be followed from it.
#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    dataset: &'a DataSet,
    table: usize,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub(crate) fn new(dataset: &'a DataSet, table: usize, index: usize) -> Self {
        Self {
            dataset,
            table,
            index,
        }
    }

    pub fn dataset(&self) -> &'a DataSet {
        self.dataset
    }

    pub fn table(&self) -> &'a DataTable {
        &self.dataset.tables()[self.table]
    }

    /// Position of the row within its table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Value of a column, `None` if the table has no such column
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let table = self.table();
        let position = table.column_index(column)?;
        table.value(self.index, position)
    }

    /// Whether the column is null or absent
    pub fn is_null(&self, column: &str) -> bool {
        self.get(column).is_none_or(Value::is_null)
    }

    /// The parent row along `relation`, `None` when no parent matches
    ///
    /// A child key containing a null never matches.
    pub fn parent_row(&self, relation: &str) -> DataSetResult<Option<RowRef<'a>>> {
        let keys = self.keys(relation)?;
        if keys.child_table != self.table {
            return Err(self.mismatch(relation));
        }

        Ok(keys
            .parent_of(self.index)
            .map(|parent| RowRef::new(self.dataset, keys.parent_table, parent)))
    }

    /// The child rows along `relation`, in child table order
    pub fn child_rows(&self, relation: &str) -> DataSetResult<Vec<RowRef<'a>>> {
        let keys = self.keys(relation)?;
        if keys.parent_table != self.table {
            return Err(self.mismatch(relation));
        }

        Ok(keys
            .children_of(self.index)
            .iter()
            .map(|&child| RowRef::new(self.dataset, keys.child_table, child))
            .collect())
    }

    fn keys(&self, relation: &str) -> DataSetResult<&'a RelationKeys> {
        self.dataset
            .relation_keys(relation)
            .ok_or_else(|| DataSetError::RelationNotFound(relation.to_string()))
    }

    fn mismatch(&self, relation: &str) -> DataSetError {
        DataSetError::RelationTableMismatch {
            relation: relation.to_string(),
            table: self.table().name.clone(),
        }
    }
}

impl fmt::Debug for RowRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowRef")
            .field("table", &self.table().name)
            .field("index", &self.index)
            .field("values", &self.table().row_values(self.index))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnType, DataColumn, DataRelation};

    fn family() -> DataSet {
        let mut dataset = DataSet::new("family");
        dataset
            .add_table(
                DataTable::new("Parents")
                    .with_column(DataColumn::new("Id", ColumnType::Int).not_null())
                    .with_row([1])
                    .unwrap()
                    .with_row([2])
                    .unwrap()
                    .with_row([3])
                    .unwrap(),
            )
            .unwrap();
        dataset
            .add_table(
                DataTable::new("Children")
                    .with_column(DataColumn::new("Id", ColumnType::Int).not_null())
                    .with_column(DataColumn::new("ParentId", ColumnType::Int))
                    .with_row([Value::from(1), Value::from(1)])
                    .unwrap()
                    .with_row([Value::from(2), Value::from(1)])
                    .unwrap()
                    .with_row([Value::from(3), Value::from(2)])
                    .unwrap()
                    .with_row([Value::from(4), Value::Null])
                    .unwrap(),
            )
            .unwrap();
        dataset
            .add_relation(DataRelation::new(
                "ParentChildren",
                "Parents",
                "Id",
                "Children",
                "ParentId",
            ))
            .unwrap();
        dataset
    }

    #[test]
    fn test_get_and_is_null() {
        let dataset = family();
        let child = dataset.row("Children", 3).unwrap();
        assert_eq!(child.get("Id"), Some(&Value::Int(4)));
        assert!(child.is_null("ParentId"));
        assert!(child.is_null("Missing"));
        assert!(child.get("Missing").is_none());
    }

    #[test]
    fn test_child_rows() {
        let dataset = family();
        let first = dataset.row("Parents", 0).unwrap();
        let ids: Vec<_> = first
            .child_rows("ParentChildren")
            .unwrap()
            .iter()
            .map(|r| r.get("Id").cloned())
            .collect();
        assert_eq!(ids, vec![Some(Value::Int(1)), Some(Value::Int(2))]);

        let third = dataset.row("Parents", 2).unwrap();
        assert!(third.child_rows("ParentChildren").unwrap().is_empty());
    }

    #[test]
    fn test_parent_row() {
        let dataset = family();
        let child = dataset.row("Children", 2).unwrap();
        let parent = child.parent_row("ParentChildren").unwrap().unwrap();
        assert_eq!(parent.get("Id"), Some(&Value::Int(2)));

        let orphan = dataset.row("Children", 3).unwrap();
        assert!(orphan.parent_row("ParentChildren").unwrap().is_none());
    }

    #[test]
    fn test_relation_errors() {
        let dataset = family();
        let parent = dataset.row("Parents", 0).unwrap();
        assert!(matches!(
            parent.parent_row("ParentChildren"),
            Err(DataSetError::RelationTableMismatch { .. })
        ));
        assert!(matches!(
            parent.child_rows("Unknown"),
            Err(DataSetError::RelationNotFound(_))
        ));
    }
}
