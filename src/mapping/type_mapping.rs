//! Per-type field mappings

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::descriptor::{FieldDescriptor, Mappable, TypeDescriptor, TypeInfo};
use super::error::{MappingError, MappingResult};
use super::marker::Marker;
use super::strategy::{ColumnMapping, MappingStrategy};

/// One mapped field and the strategy that populates it
#[derive(Debug, Clone)]
pub struct MappingEntry {
    position: usize,
    field: Arc<FieldDescriptor>,
    strategy: Arc<MappingStrategy>,
}

impl MappingEntry {
    pub fn field(&self) -> &FieldDescriptor {
        &self.field
    }

    pub fn strategy(&self) -> &MappingStrategy {
        &self.strategy
    }
}

/// The ordered field -> strategy association of one target type
///
/// Entries are kept in field declaration order and applied in that order. Field
/// names are unique within a mapping.
#[derive(Clone)]
pub struct TypeMapping {
    descriptor: Arc<TypeDescriptor>,
    entries: Vec<MappingEntry>,
}

impl TypeMapping {
    /// An empty mapping for `T`, to be filled with [`TypeMapping::add_mapping`]
    pub fn new<T: Mappable>() -> Self {
        Self::for_type(&TypeInfo::of::<T>())
    }

    pub fn for_type(info: &TypeInfo) -> Self {
        Self {
            descriptor: Arc::new(info.descriptor()),
            entries: Vec::new(),
        }
    }

    /// Generate the mapping of `T` from its field registrations
    ///
    /// Fields marked ignore are skipped, marked fields get their marker's strategy
    /// and unmarked fields of an implicitly mappable scalar kind get a column
    /// strategy keyed on the field name. Anything else is left unmapped.
    pub fn generate<T: Mappable>() -> MappingResult<Self> {
        Self::generate_for(&TypeInfo::of::<T>())
    }

    pub fn generate_for(info: &TypeInfo) -> MappingResult<Self> {
        let mut mapping = Self::for_type(info);
        let descriptor = Arc::clone(&mapping.descriptor);

        let mut seen = HashSet::new();
        for (position, field) in descriptor.fields().iter().enumerate() {
            if !seen.insert(field.name()) {
                return Err(MappingError::DuplicateMapping {
                    type_name: info.name().to_string(),
                    field: field.name().to_string(),
                });
            }

            let strategy = match field.marker() {
                Some(Marker::Ignore) => continue,
                Some(marker) => marker.to_strategy()?,
                None if field.shape().is_implicitly_mappable() => {
                    Some(ColumnMapping::new(field.name())?.into())
                }
                None => None,
            };

            if let Some(strategy) = strategy {
                mapping.entries.push(MappingEntry {
                    position,
                    field: Arc::clone(field),
                    strategy: Arc::new(strategy),
                });
            }
        }

        Ok(mapping)
    }

    /// Map a field that has no mapping yet
    pub fn add_mapping(&mut self, field: &str, strategy: impl Into<MappingStrategy>) -> MappingResult<&mut Self> {
        let (position, descriptor) = self.lookup(field)?;
        if self.entry_index(field).is_some() {
            return Err(MappingError::DuplicateMapping {
                type_name: self.type_name().to_string(),
                field: field.to_string(),
            });
        }

        let at = self
            .entries
            .iter()
            .position(|e| e.position > position)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            at,
            MappingEntry {
                position,
                field: descriptor,
                strategy: Arc::new(strategy.into()),
            },
        );
        Ok(self)
    }

    /// Replace the strategy of an already mapped field
    pub fn update_mapping(&mut self, field: &str, strategy: impl Into<MappingStrategy>) -> MappingResult<&mut Self> {
        self.lookup(field)?;
        let index = self
            .entry_index(field)
            .ok_or_else(|| MappingError::NoExistingMapping {
                type_name: self.type_name().to_string(),
                field: field.to_string(),
            })?;
        self.entries[index].strategy = Arc::new(strategy.into());
        Ok(self)
    }

    pub fn add_or_update_mapping(
        &mut self,
        field: &str,
        strategy: impl Into<MappingStrategy>,
    ) -> MappingResult<&mut Self> {
        if self.entry_index(field).is_some() {
            self.update_mapping(field, strategy)
        } else {
            self.add_mapping(field, strategy)
        }
    }

    /// The strategy mapped to `field`, if any
    pub fn get_mapping(&self, field: &str) -> Option<&MappingStrategy> {
        self.entry_index(field).map(|i| self.entries[i].strategy())
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn type_info(&self) -> TypeInfo {
        self.descriptor.type_info()
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_info().name()
    }

    /// Column names read by the column strategies, in entry order
    pub fn column_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.strategy.as_column())
            .map(|c| c.column_name().to_string())
            .collect()
    }

    /// Copy with every column strategy renamed to `prefix + column + suffix`
    pub(crate) fn with_column_affixes(&self, prefix: &str, suffix: &str) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|entry| match entry.strategy.as_column() {
                Some(column) => MappingEntry {
                    strategy: Arc::new(column.renamed(prefix, suffix).into()),
                    ..entry.clone()
                },
                None => entry.clone(),
            })
            .collect();

        Self {
            descriptor: Arc::clone(&self.descriptor),
            entries,
        }
    }

    fn lookup(&self, field: &str) -> MappingResult<(usize, Arc<FieldDescriptor>)> {
        self.descriptor
            .fields()
            .iter()
            .enumerate()
            .find(|(_, f)| f.name() == field)
            .map(|(position, f)| (position, Arc::clone(f)))
            .ok_or_else(|| MappingError::FieldNotFound {
                type_name: self.type_name().to_string(),
                field: field.to_string(),
            })
    }

    fn entry_index(&self, field: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.field.name() == field)
    }
}

impl fmt::Debug for TypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapping")
            .field("type", &self.type_name())
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|e| (e.field.name(), e.strategy.kind()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::descriptor::FieldSet;
    use crate::mapping::strategy::RelationMapping;

    #[derive(Debug, Default)]
    struct Category {
        code: String,
        value: i32,
    }

    impl Mappable for Category {
        fn describe(fields: &mut FieldSet<Self>) {
            fields.scalar("Code", |c| &mut c.code);
            fields.scalar("Value", |c| &mut c.value);
        }
    }

    #[derive(Debug, Default)]
    struct Parent {
        id: i32,
        name: String,
        notes: String,
        payload: Vec<u8>,
        category: Option<Category>,
        children: Vec<Category>,
    }

    impl Mappable for Parent {
        fn describe(fields: &mut FieldSet<Self>) {
            fields.scalar("Id", |p| &mut p.id);
            fields.scalar("Name", |p| &mut p.name).column("ParentName");
            fields.scalar("Notes", |p| &mut p.notes).ignore();
            fields.scalar("Payload", |p| &mut p.payload);
            fields.object("Category", |p| &mut p.category).relation("ParentCategory");
            fields.sequence("Children", |p| &mut p.children);
        }
    }

    #[derive(Debug, Default)]
    struct Twice {
        a: i32,
    }

    impl Mappable for Twice {
        fn describe(fields: &mut FieldSet<Self>) {
            fields.scalar("A", |t| &mut t.a);
            fields.scalar("A", |t| &mut t.a);
        }
    }

    #[test]
    fn test_generate_scalar_only_type() {
        let mapping = TypeMapping::generate::<Category>().unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.column_names(), vec!["Code".to_string(), "Value".to_string()]);
    }

    #[test]
    fn test_generate_honours_markers() {
        let mapping = TypeMapping::generate::<Parent>().unwrap();
        let fields: Vec<&str> = mapping.entries().iter().map(|e| e.field().name()).collect();
        assert_eq!(fields, vec!["Id", "Name", "Category"]);

        assert_eq!(
            mapping.get_mapping("Name").and_then(|s| s.as_column()).map(|c| c.column_name()),
            Some("ParentName")
        );
        assert!(matches!(mapping.get_mapping("Category"), Some(MappingStrategy::Relation(_))));
        assert!(mapping.get_mapping("Notes").is_none());
        assert!(mapping.get_mapping("Payload").is_none());
        assert!(mapping.get_mapping("Children").is_none());
    }

    #[test]
    fn test_duplicate_field_names_fail_generation() {
        assert!(matches!(
            TypeMapping::generate::<Twice>(),
            Err(MappingError::DuplicateMapping { ref field, .. }) if field == "A"
        ));
    }

    #[test]
    fn test_add_and_update_mapping() {
        let mut mapping = TypeMapping::generate::<Parent>().unwrap();

        assert!(matches!(
            mapping.add_mapping("Id", ColumnMapping::new("Other").unwrap()),
            Err(MappingError::DuplicateMapping { .. })
        ));
        assert!(matches!(
            mapping.update_mapping("Payload", ColumnMapping::new("Blob").unwrap()),
            Err(MappingError::NoExistingMapping { .. })
        ));
        assert!(matches!(
            mapping.add_mapping("Missing", ColumnMapping::new("X").unwrap()),
            Err(MappingError::FieldNotFound { .. })
        ));
        assert!(matches!(
            mapping.update_mapping("Missing", ColumnMapping::new("X").unwrap()),
            Err(MappingError::FieldNotFound { .. })
        ));

        mapping
            .add_mapping("Payload", ColumnMapping::new("Blob").unwrap())
            .unwrap()
            .update_mapping("Category", RelationMapping::new("Other").unwrap())
            .unwrap();

        let fields: Vec<&str> = mapping.entries().iter().map(|e| e.field().name()).collect();
        assert_eq!(fields, vec!["Id", "Name", "Payload", "Category"]);
        assert!(matches!(
            mapping.get_mapping("Category"),
            Some(MappingStrategy::Relation(r)) if r.relation_name() == "Other"
        ));
    }

    #[test]
    fn test_add_or_update_mapping() {
        let mut mapping = TypeMapping::new::<Category>();
        assert!(mapping.is_empty());

        mapping.add_or_update_mapping("Code", ColumnMapping::new("C1").unwrap()).unwrap();
        mapping.add_or_update_mapping("Code", ColumnMapping::new("C2").unwrap()).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.column_names(), vec!["C2".to_string()]);
    }

    #[test]
    fn test_column_affixes() {
        let mapping = TypeMapping::generate::<Category>().unwrap();
        let renamed = mapping.with_column_affixes("Cat", "X");
        assert_eq!(renamed.column_names(), vec!["CatCodeX".to_string(), "CatValueX".to_string()]);
        assert_eq!(mapping.column_names(), vec!["Code".to_string(), "Value".to_string()]);
    }
}
