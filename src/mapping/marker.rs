//! Declarative field markers
//!
//! A marker is attached to a field while it is registered and resolves to exactly
//! one mapping strategy when the type mapping is generated.

use super::error::MappingResult;
use super::strategy::{
    ChildRelationMapping, ChildTableMapping, ColumnMapping, CompositionMapping, MappingStrategy,
    RelationMapping,
};
use crate::dataset::TableRef;

/// Presence test a Composition applies to its check columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckLogic {
    /// Every check column exists and is non-null
    #[default]
    All,
    /// At least one check column exists and is non-null
    Any,
}

/// Arguments of a Composition marker
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompositionMarker {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub check_logic: CheckLogic,
    pub check_columns: Vec<String>,
}

impl CompositionMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to every nested column name
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Append `suffix` to every nested column name
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_check_logic(mut self, logic: CheckLogic) -> Self {
        self.check_logic = logic;
        self
    }

    /// Test these columns instead of every nested column
    pub fn with_check_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Declarative mapping marker on a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Column(String),
    Composition(CompositionMarker),
    Relation(String),
    ChildRelation(String),
    ChildTable(TableRef),
    Ignore,
}

impl Marker {
    /// The strategy this marker stands for, `None` for [`Marker::Ignore`]
    pub fn to_strategy(&self) -> MappingResult<Option<MappingStrategy>> {
        let strategy: MappingStrategy = match self {
            Marker::Column(name) => ColumnMapping::new(name.as_str())?.into(),
            Marker::Composition(marker) => CompositionMapping::new(marker.clone())?.into(),
            Marker::Relation(name) => RelationMapping::new(name.as_str())?.into(),
            Marker::ChildRelation(name) => ChildRelationMapping::new(name.as_str())?.into(),
            Marker::ChildTable(table) => ChildTableMapping::new(table.clone())?.into(),
            Marker::Ignore => return Ok(None),
        };
        Ok(Some(strategy))
    }
}
