//! Error types for row mapping operations

use thiserror::Error;

use super::descriptor::AssignError;
use crate::dataset::DataSetError;
use crate::value::ConversionError;

/// Errors that can occur while building mappings or mapping rows
#[derive(Error, Debug)]
pub enum MappingError {
    /// Invalid strategy or marker arguments
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The type has no field with this name
    #[error("Field '{field}' not found on type {type_name}")]
    FieldNotFound { type_name: String, field: String },

    /// The dataset has no relation with this name
    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    /// Table name or index does not resolve in the dataset
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The field already has a mapping
    #[error("Field '{field}' is already mapped on type {type_name}")]
    DuplicateMapping { type_name: String, field: String },

    /// The field exists but was never mapped
    #[error("Field '{field}' has no existing mapping on type {type_name}")]
    NoExistingMapping { type_name: String, field: String },

    /// A mapping set targets a different type than expected
    #[error("Type mismatch: mapping targets {found}, expected {expected}")]
    TypeMismatch { expected: String, found: String },

    /// The field's shape does not fit the strategy applied to it
    #[error("Cannot detect target type of field '{field}': {reason}")]
    TypeDetectionError { field: String, reason: String },

    /// Value coercion failed
    #[error("Type conversion error: {0}")]
    TypeConversion(#[from] ConversionError),

    /// The converted value was rejected by the field
    #[error("Failed to assign field '{field}'")]
    FieldAssignmentError {
        field: String,
        #[source]
        source: AssignError,
    },

    /// A required argument was missing
    #[error("Argument must not be null: {0}")]
    NullArgument(&'static str),

    /// An object factory produced no instance
    #[error("Factory returned nothing for type {0}")]
    FactoryReturnedNothing(String),

    /// Nested mapping went deeper than the configured limit
    #[error("Maximum mapping depth of {0} exceeded; the relation graph may be cyclic")]
    DepthLimitExceeded(usize),

    /// Dataset traversal error
    #[error("Dataset error: {0}")]
    DataSet(#[from] DataSetError),
}

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

impl MappingError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        MappingError::ValidationError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_error_display() {
        let err = MappingError::NoExistingMapping {
            type_name: "Parent".to_string(),
            field: "name".to_string(),
        };
        assert!(err.to_string().contains("no existing mapping"));

        let err = MappingError::RelationNotFound("ParentCategory".to_string());
        assert!(err.to_string().contains("ParentCategory"));
    }

    #[test]
    fn test_conversion_error_carries_value() {
        let err: MappingError = ConversionError {
            value: Value::Text("abc".to_string()),
            target_type: "i32".to_string(),
        }
        .into();
        match err {
            MappingError::TypeConversion(inner) => {
                assert_eq!(inner.value, Value::Text("abc".to_string()));
                assert_eq!(inner.target_type, "i32");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
