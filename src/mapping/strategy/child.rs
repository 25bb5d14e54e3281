//! Child collection strategies
//!
//! ChildRelation and ChildTable share everything except where their candidate rows
//! come from: the element type is taken from the field's declared shape, each
//! candidate row is mapped into a new element, and the elements are handed to the
//! field setter, which adapts them to `Vec<T>` or `Box<[T]>`.

use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use super::{construct, nested_mapping, require_name};
use crate::dataset::{RowRef, TableRef};
use crate::mapping::descriptor::{FieldDescriptor, FieldValue, ObjectFactory};
use crate::mapping::error::{MappingError, MappingResult};
use crate::mapping::mapper::MapContext;
use crate::mapping::type_mapping::TypeMapping;

/// State shared by both child strategies
#[derive(Debug, Clone, Default)]
struct ChildMapping {
    nested: Option<Arc<TypeMapping>>,
    factory: Option<ObjectFactory>,
}

impl ChildMapping {
    fn apply<'a, F>(
        &self,
        ctx: &MapContext<'_>,
        target: &mut dyn Any,
        field: &FieldDescriptor,
        row: RowRef<'a>,
        candidates: F,
    ) -> MappingResult<()>
    where
        F: FnOnce(RowRef<'a>) -> MappingResult<Vec<RowRef<'a>>>,
    {
        let info = field
            .shape()
            .element_type()
            .ok_or_else(|| MappingError::TypeDetectionError {
                field: field.name().to_string(),
                reason: format!("child mapping needs an array or sequence field, found {}", field.shape()),
            })?;
        let nested = nested_mapping(ctx, &info, self.nested.as_ref())?;

        let rows = candidates(row)?;
        trace!(field = field.name(), rows = rows.len(), "Mapping child rows");

        let mut elements = Vec::with_capacity(rows.len());
        for child in rows {
            let mut element = construct(self.factory.as_ref(), &info)?;
            ctx.map_nested(&mut *element, &info, child, &nested)?;
            elements.push(element);
        }
        field.assign(target, FieldValue::Elements(elements))
    }
}

/// Maps a collection from the child rows along a named relation
#[derive(Debug, Clone)]
pub struct ChildRelationMapping {
    relation: String,
    base: ChildMapping,
}

impl ChildRelationMapping {
    pub fn new(relation: &str) -> MappingResult<Self> {
        Ok(Self {
            relation: require_name("Relation", relation)?,
            base: ChildMapping::default(),
        })
    }

    /// Map each child row with these mappings instead of the catalog entry
    pub fn with_nested_mappings(mut self, mappings: TypeMapping) -> Self {
        self.base.nested = Some(Arc::new(mappings));
        self
    }

    pub fn with_factory(mut self, factory: ObjectFactory) -> Self {
        self.base.factory = Some(factory);
        self
    }

    pub fn relation_name(&self) -> &str {
        &self.relation
    }

    pub(crate) fn apply(
        &self,
        ctx: &MapContext<'_>,
        target: &mut dyn Any,
        field: &FieldDescriptor,
        row: RowRef<'_>,
    ) -> MappingResult<()> {
        self.base.apply(ctx, target, field, row, |row| {
            if row.dataset().relation(&self.relation).is_none() {
                return Err(MappingError::RelationNotFound(self.relation.clone()));
            }
            Ok(row.child_rows(&self.relation)?)
        })
    }
}

/// Maps a collection from every row of a table, independent of the current row
#[derive(Debug, Clone)]
pub struct ChildTableMapping {
    table: TableRef,
    base: ChildMapping,
}

impl ChildTableMapping {
    pub fn new(table: impl Into<TableRef>) -> MappingResult<Self> {
        let table = table.into();
        if let TableRef::Name(name) = &table {
            require_name("Table", name)?;
        }
        Ok(Self {
            table,
            base: ChildMapping::default(),
        })
    }

    pub fn with_nested_mappings(mut self, mappings: TypeMapping) -> Self {
        self.base.nested = Some(Arc::new(mappings));
        self
    }

    pub fn with_factory(mut self, factory: ObjectFactory) -> Self {
        self.base.factory = Some(factory);
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub(crate) fn apply(
        &self,
        ctx: &MapContext<'_>,
        target: &mut dyn Any,
        field: &FieldDescriptor,
        row: RowRef<'_>,
    ) -> MappingResult<()> {
        self.base.apply(ctx, target, field, row, |row| {
            let dataset = row.dataset();
            let index = dataset
                .table_index(&self.table)
                .ok_or_else(|| MappingError::TableNotFound(self.table.to_string()))?;
            Ok(dataset.rows_of(index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_names_rejected() {
        assert!(matches!(
            ChildRelationMapping::new(""),
            Err(MappingError::ValidationError(_))
        ));
        assert!(matches!(
            ChildTableMapping::new(" "),
            Err(MappingError::ValidationError(_))
        ));
        assert!(ChildTableMapping::new(0usize).is_ok());
    }
}
