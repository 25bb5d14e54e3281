//! Error types for dataset construction and traversal

use std::path::PathBuf;
use thiserror::Error;

use crate::value::ConversionError;

/// Errors raised while building or navigating a dataset
#[derive(Error, Debug)]
pub enum DataSetError {
    /// Failed to read a dataset file
    #[error("Failed to read dataset file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A table with the same name already exists
    #[error("Table already exists: {0}")]
    DuplicateTable(String),

    /// Table name or index does not resolve
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column does not exist on the table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Two columns with the same name on one table
    #[error("Column '{column}' defined twice in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Row arity does not match the table schema
    #[error("Row for table '{table}' has {actual} values, expected {expected}")]
    RowArity {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// Null stored in a non-nullable column
    #[error("Column '{column}' in table '{table}' does not allow null")]
    NullViolation { table: String, column: String },

    /// Value does not fit the declared column type
    #[error("Invalid value for column '{column}' in table '{table}': {source}")]
    InvalidValue {
        table: String,
        column: String,
        #[source]
        source: ConversionError,
    },

    /// A relation with the same name already exists
    #[error("Relation already exists: {0}")]
    DuplicateRelation(String),

    /// Relation name does not resolve
    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    /// Relation definition is malformed
    #[error("Invalid relation '{name}': {reason}")]
    InvalidRelation { name: String, reason: String },

    /// Relation traversed from a row of a table it does not connect
    #[error("Relation '{relation}' does not start from table '{table}'")]
    RelationTableMismatch { relation: String, table: String },
}

/// Result type for dataset operations
pub type DataSetResult<T> = Result<T, DataSetError>;
