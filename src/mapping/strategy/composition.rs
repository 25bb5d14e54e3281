//! Composition strategy

use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use super::{construct, object_type, require_name};
use crate::dataset::RowRef;
use crate::mapping::descriptor::{FieldDescriptor, FieldValue, ObjectFactory};
use crate::mapping::error::MappingResult;
use crate::mapping::mapper::MapContext;
use crate::mapping::marker::{CheckLogic, CompositionMarker};

/// Maps a nested object from columns of the current row
///
/// The nested type's column names can be rewritten with a prefix and suffix, which
/// lets one row carry several instances of the same type (`Home` / `Work` addresses,
/// for example). The object is only built when the check columns pass.
#[derive(Debug, Clone)]
pub struct CompositionMapping {
    prefix: String,
    suffix: String,
    check_logic: CheckLogic,
    check_columns: Vec<String>,
    factory: Option<ObjectFactory>,
}

impl CompositionMapping {
    pub fn new(marker: CompositionMarker) -> MappingResult<Self> {
        let check_columns = marker
            .check_columns
            .iter()
            .map(|column| require_name("Check column", column))
            .collect::<MappingResult<Vec<_>>>()?;

        Ok(Self {
            prefix: marker.prefix.unwrap_or_default(),
            suffix: marker.suffix.unwrap_or_default(),
            check_logic: marker.check_logic,
            check_columns,
            factory: None,
        })
    }

    /// Build the nested object with `factory` instead of `Default`
    pub fn with_factory(mut self, factory: ObjectFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn check_logic(&self) -> CheckLogic {
        self.check_logic
    }

    pub fn check_columns(&self) -> &[String] {
        &self.check_columns
    }

    pub(crate) fn apply(
        &self,
        ctx: &MapContext<'_>,
        target: &mut dyn Any,
        field: &FieldDescriptor,
        row: RowRef<'_>,
    ) -> MappingResult<()> {
        let info = object_type(field, "Composition")?;
        let mut nested = ctx.resolve(&info)?;
        if !self.prefix.is_empty() || !self.suffix.is_empty() {
            nested = Arc::new(nested.with_column_affixes(&self.prefix, &self.suffix));
        }

        let check_columns = if self.check_columns.is_empty() {
            nested.column_names()
        } else {
            self.check_columns.clone()
        };

        if !self.passes(&check_columns, row) {
            trace!(
                field = field.name(),
                logic = ?self.check_logic,
                "Composition check failed, leaving field unset"
            );
            return Ok(());
        }

        let mut object = construct(self.factory.as_ref(), &info)?;
        ctx.map_nested(&mut *object, &info, row, &nested)?;
        field.assign(target, FieldValue::Object(object))
    }

    fn passes(&self, columns: &[String], row: RowRef<'_>) -> bool {
        let present = |column: &String| !row.is_null(column);
        match self.check_logic {
            CheckLogic::All => columns.iter().all(present),
            CheckLogic::Any => columns.iter().any(present),
        }
    }
}
