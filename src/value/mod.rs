//! Cell values and value conversion
//!
//! Provides:
//! - `Value`: a single cell of a dataset row
//! - `ValueKind`: the scalar kind a target field expects
//! - Conversion between the two (`convert`, `change_type`)
//! - `FromValue` / `EnumValue`: extraction of converted values into Rust field types

mod convert;
mod from_value;

pub use convert::{ConversionError, change_type, convert};
pub use from_value::{EnumValue, FromValue};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A single cell value
///
/// `Null` is the dataset null. Signed and unsigned integers are kept apart so that
/// `u64` values above `i64::MAX` survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
}

impl Value {
    /// Whether this is the dataset null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::UInt(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{}", u),
        }
    }
}

macro_rules! value_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => UInt,
    u16 => UInt,
    u32 => UInt,
    u64 => UInt,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<Utc> => Timestamp,
    Uuid => Uuid,
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Text(c.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Enum metadata: the type name and its `(member name, discriminant)` pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumInfo {
    pub name: &'static str,
    pub members: &'static [(&'static str, i64)],
}

impl EnumInfo {
    pub fn discriminant_of(&self, member: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(name, _)| *name == member)
            .map(|(_, d)| *d)
    }

    pub fn has_discriminant(&self, discriminant: i64) -> bool {
        self.members.iter().any(|(_, d)| *d == discriminant)
    }
}

/// The scalar kind a field expects after conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Char,
    Text,
    Bytes,
    /// In-memory byte stream
    Stream,
    Date,
    DateTime,
    Timestamp,
    Uuid,
    Enum(EnumInfo),
}

impl ValueKind {
    /// Whether a field of this kind is mapped by name without an explicit marker
    ///
    /// Byte sequences and streams are enumerable and need an explicit column marker.
    pub fn is_implicitly_mappable(&self) -> bool {
        !matches!(self, ValueKind::Bytes | ValueKind::Stream)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueKind::Int8
                | ValueKind::Int16
                | ValueKind::Int32
                | ValueKind::Int64
                | ValueKind::UInt8
                | ValueKind::UInt16
                | ValueKind::UInt32
                | ValueKind::UInt64
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Int8 => write!(f, "i8"),
            ValueKind::Int16 => write!(f, "i16"),
            ValueKind::Int32 => write!(f, "i32"),
            ValueKind::Int64 => write!(f, "i64"),
            ValueKind::UInt8 => write!(f, "u8"),
            ValueKind::UInt16 => write!(f, "u16"),
            ValueKind::UInt32 => write!(f, "u32"),
            ValueKind::UInt64 => write!(f, "u64"),
            ValueKind::Float32 => write!(f, "f32"),
            ValueKind::Float64 => write!(f, "f64"),
            ValueKind::Char => write!(f, "char"),
            ValueKind::Text => write!(f, "text"),
            ValueKind::Bytes => write!(f, "bytes"),
            ValueKind::Stream => write!(f, "stream"),
            ValueKind::Date => write!(f, "date"),
            ValueKind::DateTime => write!(f, "datetime"),
            ValueKind::Timestamp => write!(f, "timestamp"),
            ValueKind::Uuid => write!(f, "uuid"),
            ValueKind::Enum(info) => write!(f, "enum {}", info.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(Some(3)), Value::Int(3));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from("abc"), Value::Text("abc".to_string()));
        assert_eq!(Value::from(7u16), Value::UInt(7));
    }

    #[test]
    fn test_value_deserialize_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 2, -4, 1.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Int(2),
                Value::Int(-4),
                Value::Float(1.5),
                Value::Text("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_implicitly_mappable_kinds() {
        assert!(ValueKind::Text.is_implicitly_mappable());
        assert!(ValueKind::Timestamp.is_implicitly_mappable());
        assert!(!ValueKind::Bytes.is_implicitly_mappable());
        assert!(!ValueKind::Stream.is_implicitly_mappable());
    }
}
