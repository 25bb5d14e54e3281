//! Row Mapper - maps rows of an in-memory relational dataset onto Rust objects
//!
//! Provides:
//! - An in-memory dataset model (tables, typed columns, rows, named relations)
//! - Value conversion between cell values and field types
//! - Declarative and programmatic per-field mapping strategies
//! - Recursive mapping of nested objects, parent rows and child collections
//! - A process-wide cache of generated type mappings

pub mod dataset;
pub mod mapping;
pub mod value;

// Re-export commonly used types
pub use dataset::{ColumnType, DataColumn, DataRelation, DataSet, DataSetError, DataTable, RowRef, TableRef};
pub use mapping::{
    Catalog, CheckLogic, CompositionMarker, FieldSet, Mappable, Mapper, MapperConfig, MappingError, MappingResult,
    MappingStrategy, ObjectFactory, TypeMapping,
};
pub use value::{ConversionError, EnumValue, FromValue, Value, ValueKind};
