//! Relation strategy

use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use super::{construct, nested_mapping, object_type, require_name};
use crate::dataset::RowRef;
use crate::mapping::descriptor::{FieldDescriptor, FieldValue, ObjectFactory};
use crate::mapping::error::{MappingError, MappingResult};
use crate::mapping::mapper::MapContext;
use crate::mapping::type_mapping::TypeMapping;

/// Maps a nested object from the parent row along a named relation
#[derive(Debug, Clone)]
pub struct RelationMapping {
    relation: String,
    nested: Option<Arc<TypeMapping>>,
    factory: Option<ObjectFactory>,
}

impl RelationMapping {
    pub fn new(relation: &str) -> MappingResult<Self> {
        Ok(Self {
            relation: require_name("Relation", relation)?,
            nested: None,
            factory: None,
        })
    }

    /// Map the parent row with these mappings instead of the catalog entry
    pub fn with_nested_mappings(mut self, mappings: TypeMapping) -> Self {
        self.nested = Some(Arc::new(mappings));
        self
    }

    pub fn with_factory(mut self, factory: ObjectFactory) -> Self {
        self.factory = Some(factory);
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
        let info = object_type(field, "Relation")?;
        if row.dataset().relation(&self.relation).is_none() {
            return Err(MappingError::RelationNotFound(self.relation.clone()));
        }

        let Some(parent) = row.parent_row(&self.relation)? else {
            trace!(
                relation = %self.relation,
                field = field.name(),
                "No parent row, leaving field unset"
            );
            return Ok(());
        };

        let nested = nested_mapping(ctx, &info, self.nested.as_ref())?;
        let mut object = construct(self.factory.as_ref(), &info)?;
        ctx.map_nested(&mut *object, &info, parent, &nested)?;
        field.assign(target, FieldValue::Object(object))
    }
}
