//! Extraction of converted values into Rust field types

use super::{EnumInfo, Value, ValueKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::io::Cursor;
use uuid::Uuid;

/// A Rust type a scalar field can hold
///
/// `KIND` drives the conversion performed before `from_converted` is called, so
/// implementations only need to unwrap the canonical variant for that kind.
pub trait FromValue: Sized + Send + 'static {
    const KIND: ValueKind;

    /// Build from a value already coerced to `KIND`
    fn from_converted(value: Value) -> Option<Self>;

    /// The value stored when the cell is null, `None` to leave the field as it is
    fn from_null() -> Option<Self> {
        None
    }
}

macro_rules! signed_from_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn from_converted(value: Value) -> Option<Self> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

macro_rules! unsigned_from_value {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn from_converted(value: Value) -> Option<Self> {
                    match value {
                        Value::UInt(u) => <$ty>::try_from(u).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

signed_from_value! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
}

unsigned_from_value! {
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    const KIND: ValueKind = ValueKind::Float32;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f as f32),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const KIND: ValueKind = ValueKind::Float64;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }
}

impl FromValue for char {
    const KIND: ValueKind = ValueKind::Char;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => s.chars().next(),
            _ => None,
        }
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    const KIND: ValueKind = ValueKind::Bytes;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for Cursor<Vec<u8>> {
    const KIND: ValueKind = ValueKind::Stream;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(Cursor::new(b)),
            _ => None,
        }
    }
}

impl FromValue for NaiveDate {
    const KIND: ValueKind = ValueKind::Date;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }
}

impl FromValue for NaiveDateTime {
    const KIND: ValueKind = ValueKind::DateTime;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl FromValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }
}

impl FromValue for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn from_converted(value: Value) -> Option<Self> {
        T::from_converted(value).map(Some)
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }
}

/// A fieldless Rust enum that can be filled from a member name or discriminant
///
/// ```rust
/// use row_mapper::value::EnumValue;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status {
///     Active = 1,
///     Retired = 2,
/// }
///
/// impl EnumValue for Status {
///     const NAME: &'static str = "Status";
///     const MEMBERS: &'static [(&'static str, i64)] = &[("Active", 1), ("Retired", 2)];
///
///     fn from_discriminant(discriminant: i64) -> Option<Self> {
///         match discriminant {
///             1 => Some(Status::Active),
///             2 => Some(Status::Retired),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait EnumValue: Sized + Send + 'static {
    const NAME: &'static str;
    const MEMBERS: &'static [(&'static str, i64)];

    fn from_discriminant(discriminant: i64) -> Option<Self>;

    fn info() -> EnumInfo {
        EnumInfo {
            name: Self::NAME,
            members: Self::MEMBERS,
        }
    }
}
