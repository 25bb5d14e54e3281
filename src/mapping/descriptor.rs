//! Type and field descriptors
//!
//! Rust has no runtime reflection, so every mappable type registers its writable
//! fields once through [`Mappable::describe`]. Each registration records the field
//! name, its shape, an optional declarative marker and a typed setter. The result is
//! an immutable [`TypeDescriptor`] from which type mappings are generated.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;

use super::error::{MappingError, MappingResult};
use super::marker::{CompositionMarker, Marker};
use crate::dataset::TableRef;
use crate::value::{EnumValue, FromValue, Value, ValueKind};

/// A type rows can be mapped into
///
/// # Example
///
/// ```rust
/// use row_mapper::mapping::{FieldSet, Mappable};
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
///         fields.scalar("value", |c| &mut c.value).column("Value");
///     }
/// }
/// ```
pub trait Mappable: Any + Send + Default {
    /// Register the writable fields of this type, in declaration order
    fn describe(fields: &mut FieldSet<Self>);
}

/// Runtime handle on a [`Mappable`] type
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    describe: fn() -> TypeDescriptor,
    construct: fn() -> Box<dyn Any + Send>,
}

fn describe_type<T: Mappable>() -> TypeDescriptor {
    let mut fields = FieldSet::<T>::new();
    T::describe(&mut fields);
    TypeDescriptor {
        info: TypeInfo::of::<T>(),
        fields: fields.fields.into_iter().map(Arc::new).collect(),
    }
}

fn construct_default<T: Mappable>() -> Box<dyn Any + Send> {
    Box::new(T::default())
}

impl TypeInfo {
    pub fn of<T: Mappable>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            describe: describe_type::<T>,
            construct: construct_default::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the type's field registration
    pub fn descriptor(&self) -> TypeDescriptor {
        (self.describe)()
    }

    /// A default-constructed instance
    pub fn construct(&self) -> Box<dyn Any + Send> {
        (self.construct)()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeInfo({})", self.name)
    }
}

/// The registered fields of one type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    info: TypeInfo,
    fields: Vec<Arc<FieldDescriptor>>,
}

impl TypeDescriptor {
    pub fn of<T: Mappable>() -> Self {
        describe_type::<T>()
    }

    pub fn type_info(&self) -> TypeInfo {
        self.info
    }

    pub fn fields(&self) -> &[Arc<FieldDescriptor>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declared shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A single converted value
    Scalar(ValueKind),
    /// A nested object stored as `Option<T>`
    Object(TypeInfo),
    /// A fixed collection stored as `Box<[T]>`
    Array(TypeInfo),
    /// A growable collection stored as `Vec<T>`
    Sequence(TypeInfo),
}

impl FieldShape {
    pub fn is_implicitly_mappable(&self) -> bool {
        match self {
            FieldShape::Scalar(kind) => kind.is_implicitly_mappable(),
            _ => false,
        }
    }

    /// Element type of an array or sequence field
    pub fn element_type(&self) -> Option<TypeInfo> {
        match self {
            FieldShape::Array(info) | FieldShape::Sequence(info) => Some(*info),
            _ => None,
        }
    }
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldShape::Scalar(kind) => write!(f, "{}", kind),
            FieldShape::Object(info) => write!(f, "object {}", info.name()),
            FieldShape::Array(info) => write!(f, "array of {}", info.name()),
            FieldShape::Sequence(info) => write!(f, "sequence of {}", info.name()),
        }
    }
}

/// A value ready to be written into a field
pub enum FieldValue {
    /// Converted scalar, `None` when the source was null
    Scalar(Option<Value>),
    /// A mapped nested object
    Object(Box<dyn Any + Send>),
    /// Mapped collection elements, in row order
    Elements(Vec<Box<dyn Any + Send>>),
}

impl FieldValue {
    fn shape_name(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::Object(_) => "object",
            FieldValue::Elements(_) => "elements",
        }
    }
}

/// Why a field rejected a value
#[derive(Error, Debug)]
pub enum AssignError {
    #[error("target is not a {expected}")]
    TargetType { expected: &'static str },

    #[error("field expects {expected} but received {actual}")]
    ShapeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("value '{value}' cannot be stored as {kind}")]
    ValueRejected { value: Value, kind: ValueKind },

    #[error("element is not a {expected}")]
    ElementType { expected: &'static str },
}

type Setter = dyn Fn(&mut dyn Any, FieldValue) -> Result<(), AssignError> + Send + Sync;

/// A writable member of a mappable type
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    shape: FieldShape,
    marker: Option<Marker>,
    setter: Arc<Setter>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Write a value into this field of `target`
    pub fn assign(&self, target: &mut dyn Any, value: FieldValue) -> MappingResult<()> {
        (self.setter)(target, value).map_err(|source| MappingError::FieldAssignmentError {
            field: self.name.clone(),
            source,
        })
    }

    /// Map this field from the named column
    pub fn column(&mut self, name: impl Into<String>) -> &mut Self {
        self.marker = Some(Marker::Column(name.into()));
        self
    }

    /// Map this field as a nested object built from columns of the same row
    pub fn composition(&mut self, marker: CompositionMarker) -> &mut Self {
        self.marker = Some(Marker::Composition(marker));
        self
    }

    /// Map this field from the parent row along a relation
    pub fn relation(&mut self, name: impl Into<String>) -> &mut Self {
        self.marker = Some(Marker::Relation(name.into()));
        self
    }

    /// Map this collection from the child rows along a relation
    pub fn child_relation(&mut self, name: impl Into<String>) -> &mut Self {
        self.marker = Some(Marker::ChildRelation(name.into()));
        self
    }

    /// Map this collection from every row of a table
    pub fn child_table(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.marker = Some(Marker::ChildTable(table.into()));
        self
    }

    /// Never map this field
    pub fn ignore(&mut self) -> &mut Self {
        self.marker = Some(Marker::Ignore);
        self
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}

fn downcast_target<T: Any>(target: &mut dyn Any) -> Result<&mut T, AssignError> {
    target.downcast_mut::<T>().ok_or(AssignError::TargetType {
        expected: type_name::<T>(),
    })
}

fn downcast_elements<E: Any>(items: Vec<Box<dyn Any + Send>>) -> Result<Vec<E>, AssignError> {
    items
        .into_iter()
        .map(|item| {
            item.downcast::<E>().map(|e| *e).map_err(|_| AssignError::ElementType {
                expected: type_name::<E>(),
            })
        })
        .collect()
}

fn shape_mismatch(expected: &'static str, value: &FieldValue) -> AssignError {
    AssignError::ShapeMismatch {
        expected,
        actual: value.shape_name(),
    }
}

/// Collects the field registrations of `T`
pub struct FieldSet<T> {
    fields: Vec<FieldDescriptor>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Mappable> FieldSet<T> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            _type: PhantomData,
        }
    }

    fn push(&mut self, name: &str, shape: FieldShape, setter: Arc<Setter>) -> &mut FieldDescriptor {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            shape,
            marker: None,
            setter,
        });
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    /// Register a scalar field
    ///
    /// Null leaves a plain field untouched and sets an `Option` field to `None`.
    pub fn scalar<F: FromValue>(&mut self, name: &str, accessor: fn(&mut T) -> &mut F) -> &mut FieldDescriptor {
        let setter = move |target: &mut dyn Any, value: FieldValue| -> Result<(), AssignError> {
            let target = downcast_target::<T>(target)?;
            match value {
                FieldValue::Scalar(None) => {
                    if let Some(unset) = F::from_null() {
                        *accessor(target) = unset;
                    }
                    Ok(())
                }
                FieldValue::Scalar(Some(value)) => {
                    let converted = F::from_converted(value.clone()).ok_or(AssignError::ValueRejected {
                        value,
                        kind: F::KIND,
                    })?;
                    *accessor(target) = converted;
                    Ok(())
                }
                other => Err(shape_mismatch("scalar", &other)),
            }
        };
        self.push(name, FieldShape::Scalar(F::KIND), Arc::new(setter))
    }

    /// Register a fieldless enum
    pub fn enumeration<E: EnumValue>(&mut self, name: &str, accessor: fn(&mut T) -> &mut E) -> &mut FieldDescriptor {
        let setter = move |target: &mut dyn Any, value: FieldValue| -> Result<(), AssignError> {
            let target = downcast_target::<T>(target)?;
            match value {
                FieldValue::Scalar(None) => Ok(()),
                FieldValue::Scalar(Some(value)) => {
                    *accessor(target) = enum_member::<E>(value)?;
                    Ok(())
                }
                other => Err(shape_mismatch("scalar", &other)),
            }
        };
        self.push(name, FieldShape::Scalar(ValueKind::Enum(E::info())), Arc::new(setter))
    }

    /// Register an optional fieldless enum; null stores `None`
    pub fn optional_enumeration<E: EnumValue>(
        &mut self,
        name: &str,
        accessor: fn(&mut T) -> &mut Option<E>,
    ) -> &mut FieldDescriptor {
        let setter = move |target: &mut dyn Any, value: FieldValue| -> Result<(), AssignError> {
            let target = downcast_target::<T>(target)?;
            match value {
                FieldValue::Scalar(None) => {
                    *accessor(target) = None;
                    Ok(())
                }
                FieldValue::Scalar(Some(value)) => {
                    *accessor(target) = Some(enum_member::<E>(value)?);
                    Ok(())
                }
                other => Err(shape_mismatch("scalar", &other)),
            }
        };
        self.push(name, FieldShape::Scalar(ValueKind::Enum(E::info())), Arc::new(setter))
    }

    /// Register a nested object field
    pub fn object<C: Mappable>(&mut self, name: &str, accessor: fn(&mut T) -> &mut Option<C>) -> &mut FieldDescriptor {
        let setter = move |target: &mut dyn Any, value: FieldValue| -> Result<(), AssignError> {
            let target = downcast_target::<T>(target)?;
            match value {
                FieldValue::Object(object) => {
                    let object = object.downcast::<C>().map_err(|_| AssignError::ElementType {
                        expected: type_name::<C>(),
                    })?;
                    *accessor(target) = Some(*object);
                    Ok(())
                }
                other => Err(shape_mismatch("object", &other)),
            }
        };
        self.push(name, FieldShape::Object(TypeInfo::of::<C>()), Arc::new(setter))
    }

    /// Register a boxed nested object field, for types that refer to themselves
    pub fn boxed_object<C: Mappable>(
        &mut self,
        name: &str,
        accessor: fn(&mut T) -> &mut Option<Box<C>>,
    ) -> &mut FieldDescriptor {
        let setter = move |target: &mut dyn Any, value: FieldValue| -> Result<(), AssignError> {
            let target = downcast_target::<T>(target)?;
            match value {
                FieldValue::Object(object) => {
                    let object = object.downcast::<C>().map_err(|_| AssignError::ElementType {
                        expected: type_name::<C>(),
                    })?;
                    *accessor(target) = Some(object);
                    Ok(())
                }
                other => Err(shape_mismatch("object", &other)),
            }
        };
        self.push(name, FieldShape::Object(TypeInfo::of::<C>()), Arc::new(setter))
    }

    /// Register a `Vec` collection field
    pub fn sequence<E: Mappable>(&mut self, name: &str, accessor: fn(&mut T) -> &mut Vec<E>) -> &mut FieldDescriptor {
        let setter = move |target: &mut dyn Any, value: FieldValue| -> Result<(), AssignError> {
            let target = downcast_target::<T>(target)?;
            match value {
                FieldValue::Elements(items) => {
                    *accessor(target) = downcast_elements::<E>(items)?;
                    Ok(())
                }
                other => Err(shape_mismatch("elements", &other)),
            }
        };
        self.push(name, FieldShape::Sequence(TypeInfo::of::<E>()), Arc::new(setter))
    }

    /// Register a boxed slice collection field
    pub fn array<E: Mappable>(&mut self, name: &str, accessor: fn(&mut T) -> &mut Box<[E]>) -> &mut FieldDescriptor {
        let setter = move |target: &mut dyn Any, value: FieldValue| -> Result<(), AssignError> {
            let target = downcast_target::<T>(target)?;
            match value {
                FieldValue::Elements(items) => {
                    *accessor(target) = downcast_elements::<E>(items)?.into_boxed_slice();
                    Ok(())
                }
                other => Err(shape_mismatch("elements", &other)),
            }
        };
        self.push(name, FieldShape::Array(TypeInfo::of::<E>()), Arc::new(setter))
    }
}

fn enum_member<E: EnumValue>(value: Value) -> Result<E, AssignError> {
    match value {
        Value::Int(d) => E::from_discriminant(d),
        _ => None,
    }
    .ok_or(AssignError::ValueRejected {
        value,
        kind: ValueKind::Enum(E::info()),
    })
}

/// Builds instances for Composition, Relation and Child strategies
#[derive(Clone)]
pub struct ObjectFactory {
    produce: Arc<dyn Fn() -> Option<Box<dyn Any + Send>> + Send + Sync>,
    type_name: &'static str,
}

impl ObjectFactory {
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(move || Some(Box::new(factory()) as Box<dyn Any + Send>)),
            type_name: type_name::<T>(),
        }
    }

    /// A factory that may decline to produce an instance
    pub fn optional<T, F>(factory: F) -> Self
    where
        T: Any + Send,
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        Self {
            produce: Arc::new(move || factory().map(|t| Box::new(t) as Box<dyn Any + Send>)),
            type_name: type_name::<T>(),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn produce(&self) -> MappingResult<Box<dyn Any + Send>> {
        (self.produce)().ok_or_else(|| MappingError::FactoryReturnedNothing(self.type_name.to_string()))
    }
}

impl fmt::Debug for ObjectFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectFactory({})", self.type_name)
    }
}
