//! Process-wide cache of type mappings

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use super::descriptor::{Mappable, TypeInfo};
use super::error::MappingResult;
use super::type_mapping::TypeMapping;

static GLOBAL: Lazy<Arc<Catalog>> = Lazy::new(|| Arc::new(Catalog::new()));

/// Type mappings keyed by target type
///
/// Entries are generated on first use or registered explicitly and are never
/// evicted. Generation runs outside the lock, so two threads racing on the same
/// type may both insert; the later write wins and both results are equivalent.
#[derive(Debug, Default)]
pub struct Catalog {
    mappings: RwLock<HashMap<TypeId, Arc<TypeMapping>>>,
}

impl Catalog {
    /// An empty catalog, independent of the global one
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shared by every [`Mapper`](super::Mapper) created with `Mapper::new`
    pub fn global() -> Arc<Catalog> {
        Arc::clone(&GLOBAL)
    }

    pub fn get(&self, id: TypeId) -> Option<Arc<TypeMapping>> {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn get_type<T: Mappable>(&self) -> Option<Arc<TypeMapping>> {
        self.get(TypeId::of::<T>())
    }

    pub fn contains<T: Mappable>(&self) -> bool {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// Insert or replace the mapping of its target type
    pub fn register(&self, mapping: TypeMapping) -> Arc<TypeMapping> {
        let info = mapping.type_info();
        let mapping = Arc::new(mapping);
        self.mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.id(), Arc::clone(&mapping));
        debug!(type_name = info.name(), fields = mapping.len(), "Registered type mapping");
        mapping
    }

    /// Generate the mapping of `T` and insert or replace it
    pub fn register_type<T: Mappable>(&self) -> MappingResult<Arc<TypeMapping>> {
        Ok(self.register(TypeMapping::generate::<T>()?))
    }

    /// The cached mapping of `info`, generating and caching it on first use
    pub fn ensure(&self, info: &TypeInfo) -> MappingResult<Arc<TypeMapping>> {
        if let Some(mapping) = self.get(info.id()) {
            return Ok(mapping);
        }

        let mapping = Arc::new(TypeMapping::generate_for(info)?);
        debug!(type_name = info.name(), fields = mapping.len(), "Generated type mapping");
        self.mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(info.id(), Arc::clone(&mapping));
        Ok(mapping)
    }

    pub fn len(&self) -> usize {
        self.mappings.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnType, DataColumn, DataSet, DataTable};
    use crate::mapping::descriptor::FieldSet;
    use crate::mapping::strategy::{ColumnMapping, MappingStrategy};
    use crate::mapping::Mapper;

    #[derive(Debug, Default, PartialEq)]
    struct Item {
        id: i64,
    }

    impl Mappable for Item {
        fn describe(fields: &mut FieldSet<Self>) {
            fields.scalar("Id", |i| &mut i.id);
        }
    }

    #[test]
    fn test_ensure_generates_once() {
        let catalog = Catalog::new();
        assert!(catalog.is_empty());

        let first = catalog.ensure(&TypeInfo::of::<Item>()).unwrap();
        let second = catalog.ensure(&TypeInfo::of::<Item>()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains::<Item>());
    }

    #[test]
    fn test_register_overwrites() {
        let catalog = Catalog::new();
        catalog.register_type::<Item>().unwrap();

        let mut custom = TypeMapping::new::<Item>();
        custom.add_mapping("Id", ColumnMapping::new("ItemId").unwrap()).unwrap();
        catalog.register(custom);

        let stored = catalog.get_type::<Item>().unwrap();
        assert_eq!(stored.column_names(), vec!["ItemId".to_string()]);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&Catalog::global(), &Catalog::global()));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_shared_types_are_send_sync() {
        assert_send_sync::<Catalog>();
        assert_send_sync::<Mapper>();
        assert_send_sync::<TypeMapping>();
        assert_send_sync::<MappingStrategy>();
    }

    #[test]
    fn test_concurrent_ensure_and_map() {
        let mut dataset = DataSet::new("items");
        let mut table = DataTable::new("Items").with_column(DataColumn::new("Id", ColumnType::Int));
        for id in 0..8 {
            table.add_row([id]).unwrap();
        }
        dataset.add_table(table).unwrap();

        let catalog = Arc::new(Catalog::new());
        let mapper = Mapper::with_catalog(Arc::clone(&catalog));

        let results: Vec<_> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|worker| {
                    let catalog = &catalog;
                    let mapper = &mapper;
                    let dataset = &dataset;
                    scope.spawn(move || {
                        let mapping = catalog.ensure(&TypeInfo::of::<Item>()).unwrap();
                        let item: Item = mapper
                            .map_new(dataset.row("Items", worker).unwrap(), None)
                            .unwrap()
                            .unwrap();
                        (mapping, item)
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(catalog.len(), 1);
        let expected = catalog.get_type::<Item>().unwrap().column_names();
        for (worker, (mapping, item)) in results.iter().enumerate() {
            assert_eq!(mapping.column_names(), expected);
            assert_eq!(mapping.type_info(), TypeInfo::of::<Item>());
            assert_eq!(*item, Item { id: worker as i64 });
        }
    }
}
