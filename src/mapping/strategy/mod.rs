//! Field mapping strategies
//!
//! The closed set of rules that populate one field from a row:
//! - `Column`: a converted cell of the current row
//! - `Composition`: a nested object built from columns of the current row
//! - `Relation`: a nested object built from the parent row along a relation
//! - `ChildRelation`: a collection built from the child rows along a relation
//! - `ChildTable`: a collection built from every row of a table

mod child;
mod column;
mod composition;
mod relation;

pub use child::{ChildRelationMapping, ChildTableMapping};
pub use column::ColumnMapping;
pub use composition::CompositionMapping;
pub use relation::RelationMapping;

use std::any::Any;
use std::sync::Arc;

use super::descriptor::{FieldDescriptor, ObjectFactory, TypeInfo};
use super::error::{MappingError, MappingResult};
use super::mapper::MapContext;
use super::type_mapping::TypeMapping;
use crate::dataset::RowRef;

/// How one field is populated from a row and its dataset
#[derive(Debug, Clone)]
pub enum MappingStrategy {
    Column(ColumnMapping),
    Composition(CompositionMapping),
    Relation(RelationMapping),
    ChildRelation(ChildRelationMapping),
    ChildTable(ChildTableMapping),
}

impl MappingStrategy {
    pub(crate) fn apply(
        &self,
        ctx: &MapContext<'_>,
        target: &mut dyn Any,
        field: &FieldDescriptor,
        row: RowRef<'_>,
    ) -> MappingResult<()> {
        match self {
            MappingStrategy::Column(s) => s.apply(target, field, row),
            MappingStrategy::Composition(s) => s.apply(ctx, target, field, row),
            MappingStrategy::Relation(s) => s.apply(ctx, target, field, row),
            MappingStrategy::ChildRelation(s) => s.apply(ctx, target, field, row),
            MappingStrategy::ChildTable(s) => s.apply(ctx, target, field, row),
        }
    }

    pub fn as_column(&self) -> Option<&ColumnMapping> {
        match self {
            MappingStrategy::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Short variant name, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            MappingStrategy::Column(_) => "column",
            MappingStrategy::Composition(_) => "composition",
            MappingStrategy::Relation(_) => "relation",
            MappingStrategy::ChildRelation(_) => "child_relation",
            MappingStrategy::ChildTable(_) => "child_table",
        }
    }
}

impl From<ColumnMapping> for MappingStrategy {
    fn from(s: ColumnMapping) -> Self {
        MappingStrategy::Column(s)
    }
}

impl From<CompositionMapping> for MappingStrategy {
    fn from(s: CompositionMapping) -> Self {
        MappingStrategy::Composition(s)
    }
}

impl From<RelationMapping> for MappingStrategy {
    fn from(s: RelationMapping) -> Self {
        MappingStrategy::Relation(s)
    }
}

impl From<ChildRelationMapping> for MappingStrategy {
    fn from(s: ChildRelationMapping) -> Self {
        MappingStrategy::ChildRelation(s)
    }
}

impl From<ChildTableMapping> for MappingStrategy {
    fn from(s: ChildTableMapping) -> Self {
        MappingStrategy::ChildTable(s)
    }
}

/// Reject blank names at construction time
fn require_name(what: &str, name: &str) -> MappingResult<String> {
    if name.trim().is_empty() {
        return Err(MappingError::validation(format!("{} name must not be blank", what)));
    }
    Ok(name.to_string())
}

/// Build an instance of `info`, through the factory when one is given
fn construct(
    factory: Option<&ObjectFactory>,
    info: &TypeInfo,
) -> MappingResult<Box<dyn Any + Send>> {
    let (object, produced) = match factory {
        Some(factory) => (factory.produce()?, factory.type_name()),
        None => (info.construct(), info.name()),
    };
    if (*object).type_id() != info.id() {
        return Err(MappingError::TypeMismatch {
            expected: info.name().to_string(),
            found: produced.to_string(),
        });
    }
    Ok(object)
}

/// Caller-supplied nested mappings, checked against the detected type, or the
/// catalog entry for that type
fn nested_mapping(
    ctx: &MapContext<'_>,
    info: &TypeInfo,
    supplied: Option<&Arc<TypeMapping>>,
) -> MappingResult<Arc<TypeMapping>> {
    match supplied {
        Some(mapping) if mapping.type_info().id() != info.id() => Err(MappingError::TypeMismatch {
            expected: info.name().to_string(),
            found: mapping.type_info().name().to_string(),
        }),
        Some(mapping) => Ok(Arc::clone(mapping)),
        None => ctx.resolve(info),
    }
}

fn object_type(field: &FieldDescriptor, strategy: &str) -> MappingResult<TypeInfo> {
    match field.shape() {
        super::FieldShape::Object(info) => Ok(info),
        other => Err(MappingError::TypeDetectionError {
            field: field.name().to_string(),
            reason: format!("{} needs an object field, found {}", strategy, other),
        }),
    }
}
