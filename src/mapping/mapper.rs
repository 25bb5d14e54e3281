//! Mapper entry points
//!
//! The mapper resolves the type mapping of the target (explicit, cached or freshly
//! generated) and applies its entries to the target in field declaration order.
//! Nested strategies call back into the same context, one level deeper.

use std::any::{Any, TypeId};
use std::sync::Arc;

use tracing::trace;

use super::catalog::Catalog;
use super::config::MapperConfig;
use super::descriptor::{Mappable, TypeInfo};
use super::error::{MappingError, MappingResult};
use super::type_mapping::TypeMapping;
use crate::dataset::{DataSet, RowRef, TableRef};

/// State threaded through one mapping call
#[derive(Clone, Copy)]
pub(crate) struct MapContext<'m> {
    catalog: &'m Catalog,
    config: &'m MapperConfig,
    depth: usize,
}

impl MapContext<'_> {
    /// The catalog entry for `info`, generated on first use
    pub(crate) fn resolve(&self, info: &TypeInfo) -> MappingResult<Arc<TypeMapping>> {
        self.catalog.ensure(info)
    }

    /// Map `row` into a nested object one level below the current one
    pub(crate) fn map_nested(
        &self,
        target: &mut dyn Any,
        info: &TypeInfo,
        row: RowRef<'_>,
        mapping: &TypeMapping,
    ) -> MappingResult<()> {
        let depth = self.depth + 1;
        if let Some(max) = self.config.max_depth
            && depth > max
        {
            return Err(MappingError::DepthLimitExceeded(max));
        }

        trace!(type_name = info.name(), depth, row = row.index(), "Mapping nested object");
        let nested = MapContext { depth, ..*self };
        nested.apply_mapping(target, row, mapping)
    }

    /// Apply every entry of `mapping` to `target`, stopping at the first error
    fn apply_mapping(&self, target: &mut dyn Any, row: RowRef<'_>, mapping: &TypeMapping) -> MappingResult<()> {
        for entry in mapping.entries() {
            entry.strategy().apply(self, target, entry.field(), row)?;
        }
        Ok(())
    }
}

/// Maps rows of a [`DataSet`] into objects
///
/// # Example
///
/// ```rust
/// use row_mapper::dataset::{ColumnType, DataColumn, DataSet, DataTable};
/// use row_mapper::mapping::{FieldSet, Mappable, Mapper};
/// use row_mapper::value::Value;
///
/// #[derive(Debug, Default)]
/// struct Category {
///     code: String,
///     value: i32,
/// }
///
/// impl Mappable for Category {
///     fn describe(fields: &mut FieldSet<Self>) {
///         fields.scalar("Code", |c| &mut c.code);
///         fields.scalar("Value", |c| &mut c.value);
///     }
/// }
///
/// let mut dataset = DataSet::new("shop");
/// dataset
///     .add_table(
///         DataTable::new("Categories")
///             .with_column(DataColumn::new("Code", ColumnType::Text))
///             .with_column(DataColumn::new("Value", ColumnType::Int))
///             .with_row([Value::from("Code1"), Value::from(2)])
///             .unwrap(),
///     )
///     .unwrap();
///
/// let row = dataset.row("Categories", 0).unwrap();
/// let category: Category = Mapper::new().map_new(row, None).unwrap().unwrap();
/// assert_eq!(category.code, "Code1");
/// assert_eq!(category.value, 2);
/// ```
#[derive(Debug, Clone)]
pub struct Mapper {
    catalog: Arc<Catalog>,
    config: MapperConfig,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper {
    /// A mapper backed by the process-wide catalog
    pub fn new() -> Self {
        Self::with_catalog(Catalog::global())
    }

    /// A mapper backed by its own catalog
    pub fn with_catalog(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            config: MapperConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Map `row` into an instance produced by `factory`
    ///
    /// A missing row yields `Ok(None)` without calling the factory. A factory that
    /// produces nothing fails with [`MappingError::FactoryReturnedNothing`].
    pub fn map<'a, T, F>(
        &self,
        factory: F,
        row: impl Into<Option<RowRef<'a>>>,
        mappings: Option<&TypeMapping>,
    ) -> MappingResult<Option<T>>
    where
        T: Mappable,
        F: FnOnce() -> Option<T>,
    {
        let Some(row) = row.into() else {
            return Ok(None);
        };
        let mut target =
            factory().ok_or_else(|| MappingError::FactoryReturnedNothing(TypeInfo::of::<T>().name().to_string()))?;
        self.apply(&mut target, row, mappings)?;
        Ok(Some(target))
    }

    /// Map `row` into a default-constructed instance
    pub fn map_new<'a, T: Mappable>(
        &self,
        row: impl Into<Option<RowRef<'a>>>,
        mappings: Option<&TypeMapping>,
    ) -> MappingResult<Option<T>> {
        self.map(|| Some(T::default()), row, mappings)
    }

    /// Map `row` into an existing instance
    ///
    /// Fields without a mapping, and fields whose source is missing, keep their
    /// current values. Mapping is not transactional: on error the fields mapped
    /// before the failing one stay written.
    pub fn map_into<'a, T: Mappable>(
        &self,
        target: &mut T,
        row: impl Into<Option<RowRef<'a>>>,
        mappings: Option<&TypeMapping>,
    ) -> MappingResult<()> {
        let row = row.into().ok_or(MappingError::NullArgument("row"))?;
        self.apply(target, row, mappings)
    }

    /// Map every row of a table, in row order
    pub fn map_table<T: Mappable>(
        &self,
        dataset: &DataSet,
        table: impl Into<TableRef>,
        mappings: Option<&TypeMapping>,
    ) -> MappingResult<Vec<T>> {
        let table = table.into();
        let rows = dataset
            .rows(table.clone())
            .ok_or_else(|| MappingError::TableNotFound(table.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let mut target = T::default();
                self.apply(&mut target, row, mappings)?;
                Ok(target)
            })
            .collect()
    }

    /// Generate the mapping of `T` and store it in the catalog, replacing any entry
    pub fn add_type_mappings<T: Mappable>(&self) -> MappingResult<Arc<TypeMapping>> {
        self.catalog.register_type::<T>()
    }

    /// Store an explicit mapping in the catalog, replacing any entry for its type
    pub fn add_type_mapping(&self, mapping: TypeMapping) -> Arc<TypeMapping> {
        self.catalog.register(mapping)
    }

    fn context(&self) -> MapContext<'_> {
        MapContext {
            catalog: self.catalog.as_ref(),
            config: &self.config,
            depth: 0,
        }
    }

    fn apply<T: Mappable>(&self, target: &mut T, row: RowRef<'_>, mappings: Option<&TypeMapping>) -> MappingResult<()> {
        let ctx = self.context();
        match mappings {
            Some(mapping) if mapping.type_info().id() != TypeId::of::<T>() => Err(MappingError::TypeMismatch {
                expected: TypeInfo::of::<T>().name().to_string(),
                found: mapping.type_name().to_string(),
            }),
            Some(mapping) => ctx.apply_mapping(target, row, mapping),
            None => {
                let mapping = ctx.resolve(&TypeInfo::of::<T>())?;
                ctx.apply_mapping(target, row, &mapping)
            }
        }
    }
}
