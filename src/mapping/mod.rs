//! Row-to-object mapping
//!
//! Types opt in by implementing [`Mappable`], registering each writable field with
//! an optional declarative marker. A [`TypeMapping`] is generated from that
//! registration (or assembled by hand) and associates every mapped field with a
//! [`MappingStrategy`]. The [`Mapper`] applies those strategies to rows, resolving
//! nested types through the [`Catalog`].

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod mapper;
pub mod marker;
pub mod strategy;
pub mod type_mapping;

pub use catalog::Catalog;
pub use config::{DEFAULT_MAX_DEPTH, MapperConfig};
pub use descriptor::{
    AssignError, FieldDescriptor, FieldSet, FieldShape, FieldValue, Mappable, ObjectFactory, TypeDescriptor,
    TypeInfo,
};
pub use error::{MappingError, MappingResult};
pub use mapper::Mapper;
pub use marker::{CheckLogic, CompositionMarker, Marker};
pub use strategy::{
    ChildRelationMapping, ChildTableMapping, ColumnMapping, CompositionMapping, MappingStrategy, RelationMapping,
};
pub use type_mapping::{MappingEntry, TypeMapping};
