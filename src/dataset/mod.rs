//! In-memory relational dataset
//!
//! Tables with typed columns, positional rows and named relations between tables.
//! The mapping engine only reads from a dataset; it never mutates one.
//!
//! # Example
//!
//! ```rust
//! use row_mapper::dataset::{ColumnType, DataColumn, DataRelation, DataSet, DataTable};
//!
//! let parents = DataTable::new("Parents")
//!     .with_column(DataColumn::new("Id", ColumnType::Int).not_null())
//!     .with_row([1])?;
//! let children = DataTable::new("Children")
//!     .with_column(DataColumn::new("Id", ColumnType::Int).not_null())
//!     .with_column(DataColumn::new("ParentId", ColumnType::Int))
//!     .with_row([1, 1])?
//!     .with_row([2, 1])?;
//!
//! let mut dataset = DataSet::new("family");
//! dataset.add_table(parents)?;
//! dataset.add_table(children)?;
//! dataset.add_relation(DataRelation::new("ParentChildren", "Parents", "Id", "Children", "ParentId"))?;
//!
//! let parent = dataset.row("Parents", 0).unwrap();
//! assert_eq!(parent.child_rows("ParentChildren")?.len(), 2);
//! # Ok::<(), row_mapper::dataset::DataSetError>(())
//! ```

mod column;
mod error;
mod relation;
mod row;
mod table;

pub use column::{ColumnType, DataColumn};
pub use error::{DataSetError, DataSetResult};
pub use relation::DataRelation;
pub use row::RowRef;
pub use table::DataTable;

use relation::RelationKeys;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifies a table by name or by position within a dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableRef {
    Index(usize),
    Name(String),
}

impl From<&str> for TableRef {
    fn from(name: &str) -> Self {
        TableRef::Name(name.to_string())
    }
}

impl From<String> for TableRef {
    fn from(name: String) -> Self {
        TableRef::Name(name)
    }
}

impl From<usize> for TableRef {
    fn from(index: usize) -> Self {
        TableRef::Index(index)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRef::Index(i) => write!(f, "#{}", i),
            TableRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A set of tables and the relations between them
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DataSet {
    pub name: String,
    tables: Vec<DataTable>,
    relations: Vec<DataRelation>,
    #[serde(skip)]
    keys: Vec<RelationKeys>,
}

/// Serialized form of a dataset, validated through the regular builder on load
#[derive(Deserialize)]
struct DataSetDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    tables: Vec<DataTable>,
    #[serde(default)]
    relations: Vec<DataRelation>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
            relations: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Parse and validate a dataset from a JSON document
    ///
    /// ```json
    /// {
    ///   "name": "shop",
    ///   "tables": [
    ///     { "name": "Category", "columns": [{ "name": "Code", "data_type": "text" }], "rows": [["C1"]] }
    ///   ],
    ///   "relations": []
    /// }
    /// ```
    pub fn from_json(json: &str) -> DataSetResult<Self> {
        let document: DataSetDocument = serde_json::from_str(json)?;
        let mut dataset = DataSet::new(document.name);
        for table in document.tables {
            dataset.add_table(table)?;
        }
        for relation in document.relations {
            dataset.add_relation(relation)?;
        }
        Ok(dataset)
    }

    /// Read a dataset from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> DataSetResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DataSetError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Add a table, returning its index
    ///
    /// Every row is checked against the schema again, so tables deserialized
    /// directly get the same arity, nullability and type checks as built ones.
    pub fn add_table(&mut self, mut table: DataTable) -> DataSetResult<usize> {
        if self.tables.iter().any(|t| t.name == table.name) {
            return Err(DataSetError::DuplicateTable(table.name));
        }
        table.validate_schema()?;
        for row in table.take_rows() {
            table.add_row(row)?;
        }
        self.tables.push(table);
        Ok(self.tables.len() - 1)
    }

    /// Add a relation after checking that its tables and key columns exist
    pub fn add_relation(&mut self, relation: DataRelation) -> DataSetResult<()> {
        if self.relation(&relation.name).is_some() {
            return Err(DataSetError::DuplicateRelation(relation.name));
        }
        if relation.parent_columns.is_empty()
            || relation.parent_columns.len() != relation.child_columns.len()
        {
            return Err(DataSetError::InvalidRelation {
                name: relation.name.clone(),
                reason: format!(
                    "{} parent columns do not match {} child columns",
                    relation.parent_columns.len(),
                    relation.child_columns.len()
                ),
            });
        }

        let (parent_table, parent_columns) =
            self.resolve_columns(&relation.parent_table, &relation.parent_columns)?;
        let (child_table, child_columns) =
            self.resolve_columns(&relation.child_table, &relation.child_columns)?;

        self.keys.push(RelationKeys::link(
            &self.tables,
            parent_table,
            &parent_columns,
            child_table,
            &child_columns,
        ));
        self.relations.push(relation);
        Ok(())
    }

    fn resolve_columns(&self, table: &str, columns: &[String]) -> DataSetResult<(usize, Vec<usize>)> {
        let index = self
            .table_index(&TableRef::from(table))
            .ok_or_else(|| DataSetError::TableNotFound(table.to_string()))?;
        let positions = columns
            .iter()
            .map(|column| {
                self.tables[index]
                    .column_index(column)
                    .ok_or_else(|| DataSetError::ColumnNotFound {
                        table: table.to_string(),
                        column: column.clone(),
                    })
            })
            .collect::<DataSetResult<Vec<_>>>()?;
        Ok((index, positions))
    }

    pub fn tables(&self) -> &[DataTable] {
        &self.tables
    }

    pub fn relations(&self) -> &[DataRelation] {
        &self.relations
    }

    pub fn table_index(&self, table: &TableRef) -> Option<usize> {
        match table {
            TableRef::Index(i) => (*i < self.tables.len()).then_some(*i),
            TableRef::Name(name) => self.tables.iter().position(|t| &t.name == name),
        }
    }

    pub fn table(&self, table: impl Into<TableRef>) -> Option<&DataTable> {
        self.table_index(&table.into()).map(|i| &self.tables[i])
    }

    pub fn relation(&self, name: &str) -> Option<&DataRelation> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub(crate) fn relation_keys(&self, name: &str) -> Option<&RelationKeys> {
        self.relations
            .iter()
            .position(|r| r.name == name)
            .map(|i| &self.keys[i])
    }

    /// All rows of a table, in insertion order
    pub fn rows(&self, table: impl Into<TableRef>) -> Option<Vec<RowRef<'_>>> {
        let table = self.table_index(&table.into())?;
        Some(self.rows_of(table))
    }

    pub(crate) fn rows_of(&self, table: usize) -> Vec<RowRef<'_>> {
        (0..self.tables[table].row_count())
            .map(|index| RowRef::new(self, table, index))
            .collect()
    }

    /// A single row by table and position
    pub fn row(&self, table: impl Into<TableRef>, index: usize) -> Option<RowRef<'_>> {
        let table = self.table_index(&table.into())?;
        (index < self.tables[table].row_count()).then(|| RowRef::new(self, table, index))
    }
}
