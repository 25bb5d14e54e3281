//! Table model for datasets

use serde::{Deserialize, Serialize};

use super::column::DataColumn;
use super::error::{DataSetError, DataSetResult};
use crate::value::Value;

/// A named table: ordered columns and ordered rows
///
/// Rows are stored positionally in column order. Every row added through
/// [`DataTable::add_row`] is checked against the schema and its values are
/// coerced to the declared column types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a column to the schema
    pub fn with_column(mut self, column: DataColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = DataColumn>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Add a row and return `self`, for building fixtures
    pub fn with_row<I, V>(mut self, values: I) -> DataSetResult<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_row(values)?;
        Ok(self)
    }

    /// Validate and append a row, returning its index
    pub fn add_row<I, V>(&mut self, values: I) -> DataSetResult<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.columns.len() {
            return Err(DataSetError::RowArity {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        let mut row = Vec::with_capacity(values.len());
        for (column, value) in self.columns.iter().zip(values) {
            if value.is_null() && !column.nullable {
                return Err(DataSetError::NullViolation {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
            let value =
                column
                    .data_type
                    .normalize(value)
                    .map_err(|source| DataSetError::InvalidValue {
                        table: self.name.clone(),
                        column: column.name.clone(),
                        source,
                    })?;
            row.push(value);
        }

        self.rows.push(row);
        Ok(self.rows.len() - 1)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw values of the row at `index`
    pub fn row_values(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub(crate) fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|values| values.get(column))
    }

    /// Check the schema for duplicate column names
    pub(crate) fn validate_schema(&self) -> DataSetResult<()> {
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(DataSetError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Move the raw rows out, leaving the schema in place
    pub(crate) fn take_rows(&mut self) -> Vec<Vec<Value>> {
        std::mem::take(&mut self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnType;

    fn parent_table() -> DataTable {
        DataTable::new("Parent")
            .with_column(DataColumn::new("Id", ColumnType::Int).not_null())
            .with_column(DataColumn::new("Name", ColumnType::Text))
    }

    #[test]
    fn test_add_row_coerces_values() {
        let mut table = parent_table();
        let index = table
            .add_row([Value::Text("7".to_string()), Value::from("Seven")])
            .unwrap();

        assert_eq!(index, 0);
        assert_eq!(table.row_values(0).unwrap()[0], Value::Int(7));
    }

    #[test]
    fn test_add_row_rejects_wrong_arity() {
        let mut table = parent_table();
        let err = table.add_row([1]).unwrap_err();
        assert!(matches!(
            err,
            DataSetError::RowArity {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_add_row_rejects_null_in_required_column() {
        let mut table = parent_table();
        let err = table.add_row([Value::Null, Value::from("x")]).unwrap_err();
        assert!(matches!(err, DataSetError::NullViolation { .. }));
    }

    #[test]
    fn test_duplicate_column_detected() {
        let table = parent_table().with_column(DataColumn::new("Id", ColumnType::Int));
        assert!(matches!(
            table.validate_schema(),
            Err(DataSetError::DuplicateColumn { .. })
        ));
    }
}
