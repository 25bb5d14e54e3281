//! Column strategy

use std::any::Any;

use tracing::trace;

use super::require_name;
use crate::dataset::RowRef;
use crate::mapping::descriptor::{FieldDescriptor, FieldShape, FieldValue};
use crate::mapping::error::MappingResult;
use crate::value::{ConversionError, convert};

/// Maps a field from one column of the current row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    column: String,
}

impl ColumnMapping {
    /// Create a column mapping; the name must not be blank
    pub fn new(column: &str) -> MappingResult<Self> {
        Ok(Self {
            column: require_name("Column", column)?,
        })
    }

    pub fn column_name(&self) -> &str {
        &self.column
    }

    /// Copy with `prefix + column + suffix` as the column name
    pub(crate) fn renamed(&self, prefix: &str, suffix: &str) -> Self {
        Self {
            column: format!("{}{}{}", prefix, self.column, suffix),
        }
    }

    pub(crate) fn apply(
        &self,
        target: &mut dyn Any,
        field: &FieldDescriptor,
        row: RowRef<'_>,
    ) -> MappingResult<()> {
        let Some(raw) = row.get(&self.column) else {
            trace!(
                column = %self.column,
                table = %row.table().name,
                field = field.name(),
                "Column not in table, leaving field unchanged"
            );
            return Ok(());
        };

        let FieldShape::Scalar(kind) = field.shape() else {
            return Err(ConversionError {
                value: raw.clone(),
                target_type: field.shape().to_string(),
            }
            .into());
        };

        let converted = convert(raw, kind)?;
        field.assign(target, FieldValue::Scalar(converted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingError;

    #[test]
    fn test_blank_column_rejected() {
        assert!(matches!(
            ColumnMapping::new(" "),
            Err(MappingError::ValidationError(_))
        ));
    }

    #[test]
    fn test_renamed() {
        let column = ColumnMapping::new("Code").unwrap().renamed("Cat", "_1");
        assert_eq!(column.column_name(), "CatCode_1");
    }
}
