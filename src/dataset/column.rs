//! Column model for datasets

use serde::{Deserialize, Serialize};

use crate::value::{ConversionError, Value, ValueKind, change_type};

/// Declared storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Values are stored as given
    #[default]
    Any,
    Bool,
    Int,
    UInt,
    Float,
    Text,
    Bytes,
    Date,
    DateTime,
    Timestamp,
    Uuid,
}

impl ColumnType {
    fn value_kind(self) -> Option<ValueKind> {
        match self {
            ColumnType::Any => None,
            ColumnType::Bool => Some(ValueKind::Bool),
            ColumnType::Int => Some(ValueKind::Int64),
            ColumnType::UInt => Some(ValueKind::UInt64),
            ColumnType::Float => Some(ValueKind::Float64),
            ColumnType::Text => Some(ValueKind::Text),
            ColumnType::Bytes => Some(ValueKind::Bytes),
            ColumnType::Date => Some(ValueKind::Date),
            ColumnType::DateTime => Some(ValueKind::DateTime),
            ColumnType::Timestamp => Some(ValueKind::Timestamp),
            ColumnType::Uuid => Some(ValueKind::Uuid),
        }
    }

    /// Coerce a non-null value to this column type
    pub fn normalize(self, value: Value) -> Result<Value, ConversionError> {
        match self.value_kind() {
            Some(kind) if !value.is_null() => change_type(&value, kind),
            _ => Ok(value),
        }
    }
}

/// Column of a data table
///
/// # Example
///
/// ```rust
/// use row_mapper::dataset::{ColumnType, DataColumn};
///
/// let column = DataColumn::new("Id", ColumnType::Int).not_null();
/// assert!(!column.nullable);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataColumn {
    /// Column name
    pub name: String,
    /// Declared type (default: any)
    #[serde(default)]
    pub data_type: ColumnType,
    /// Whether the column allows NULL values (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,
}

fn default_true() -> bool {
    true
}

impl DataColumn {
    /// Create a nullable column
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Disallow NULL values
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_coerces_to_declared_type() {
        assert_eq!(
            ColumnType::Int.normalize(Value::Text("12".to_string())).unwrap(),
            Value::Int(12)
        );
        assert_eq!(ColumnType::Int.normalize(Value::Null).unwrap(), Value::Null);
        assert_eq!(
            ColumnType::Any.normalize(Value::Text("12".to_string())).unwrap(),
            Value::Text("12".to_string())
        );
        assert!(ColumnType::Uuid.normalize(Value::Int(1)).is_err());
    }

    #[test]
    fn test_column_deserialize_defaults() {
        let column: DataColumn = serde_json::from_str(r#"{"name": "Code"}"#).unwrap();
        assert_eq!(column.data_type, ColumnType::Any);
        assert!(column.nullable);
    }
}
