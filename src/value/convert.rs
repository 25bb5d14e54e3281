//! Coercion of cell values into the kind a field expects

use super::{EnumInfo, Value, ValueKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// A value could not be coerced into the requested kind
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Cannot convert value '{value}' ({source_type}) to {target_type}", source_type = .value.type_name())]
pub struct ConversionError {
    pub value: Value,
    pub target_type: String,
}

impl ConversionError {
    fn new(value: &Value, kind: ValueKind) -> Self {
        Self {
            value: value.clone(),
            target_type: kind.to_string(),
        }
    }
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Convert a raw cell value for a field of the given kind
///
/// Returns `Ok(None)` for the dataset null, which leaves the field unset.
pub fn convert(value: &Value, kind: ValueKind) -> Result<Option<Value>, ConversionError> {
    if value.is_null() {
        return Ok(None);
    }
    change_type(value, kind).map(Some)
}

/// Coerce a non-null value into the canonical representation of `kind`
///
/// Signed integers come back as `Value::Int`, unsigned as `Value::UInt`, chars as a
/// one-character `Value::Text`, streams as `Value::Bytes` and enums as the member's
/// discriminant in `Value::Int`.
pub fn change_type(value: &Value, kind: ValueKind) -> Result<Value, ConversionError> {
    let err = || ConversionError::new(value, kind);

    let converted = match kind {
        ValueKind::Bool => to_bool(value).map(Value::Bool),
        ValueKind::Int8 => to_signed(value, i8::MIN as i128, i8::MAX as i128),
        ValueKind::Int16 => to_signed(value, i16::MIN as i128, i16::MAX as i128),
        ValueKind::Int32 => to_signed(value, i32::MIN as i128, i32::MAX as i128),
        ValueKind::Int64 => to_signed(value, i64::MIN as i128, i64::MAX as i128),
        ValueKind::UInt8 => to_unsigned(value, u8::MAX as i128),
        ValueKind::UInt16 => to_unsigned(value, u16::MAX as i128),
        ValueKind::UInt32 => to_unsigned(value, u32::MAX as i128),
        ValueKind::UInt64 => to_unsigned(value, u64::MAX as i128),
        ValueKind::Float32 | ValueKind::Float64 => to_f64(value).map(Value::Float),
        ValueKind::Char => to_char(value).map(|c| Value::Text(c.to_string())),
        ValueKind::Text => match value {
            Value::Bytes(_) => None,
            other => Some(Value::Text(other.to_string())),
        },
        ValueKind::Bytes | ValueKind::Stream => match value {
            Value::Bytes(b) => Some(Value::Bytes(b.clone())),
            _ => None,
        },
        ValueKind::Date => to_date(value).map(Value::Date),
        ValueKind::DateTime => to_datetime(value).map(Value::DateTime),
        ValueKind::Timestamp => to_timestamp(value).map(Value::Timestamp),
        ValueKind::Uuid => to_uuid(value).map(Value::Uuid),
        ValueKind::Enum(info) => to_enum(value, &info).map(Value::Int),
    };

    converted.ok_or_else(err)
}

fn to_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Bool(b) => Some(i128::from(*b)),
        Value::Int(i) => Some(i128::from(*i)),
        Value::UInt(u) => Some(i128::from(*u)),
        Value::Float(f) if f.is_finite() => {
            let rounded = f.round_ties_even();
            if rounded >= i128::MIN as f64 && rounded <= i128::MAX as f64 {
                Some(rounded as i128)
            } else {
                None
            }
        }
        Value::Text(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}

fn to_signed(value: &Value, min: i128, max: i128) -> Option<Value> {
    to_integer(value)
        .filter(|i| (min..=max).contains(i))
        .map(|i| Value::Int(i as i64))
}

fn to_unsigned(value: &Value, max: i128) -> Option<Value> {
    to_integer(value)
        .filter(|i| (0..=max).contains(i))
        .map(|i| Value::UInt(i as u64))
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Float(f) => Some(*f),
        Value::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::UInt(u) => Some(*u != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_char(value: &Value) -> Option<char> {
    match value {
        Value::Text(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
        Value::Int(_) | Value::UInt(_) => to_integer(value)
            .and_then(|i| u32::try_from(i).ok())
            .and_then(char::from_u32),
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn to_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        Value::Timestamp(ts) => Some(ts.date_naive()),
        Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .or_else(|| parse_datetime(s).map(|dt| dt.date())),
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
        Value::DateTime(dt) => Some(*dt),
        Value::Timestamp(ts) => Some(ts.naive_utc()),
        Value::Text(s) => parse_datetime(s).or_else(|| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        }),
        _ => None,
    }
}

fn to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Timestamp(ts) => Some(*ts),
        other => to_datetime(other).map(|dt| dt.and_utc()),
    }
}

fn to_uuid(value: &Value) -> Option<Uuid> {
    match value {
        Value::Uuid(u) => Some(*u),
        Value::Text(s) => Uuid::parse_str(s.trim()).ok(),
        Value::Bytes(b) => Uuid::from_slice(b).ok(),
        _ => None,
    }
}

fn to_enum(value: &Value, info: &EnumInfo) -> Option<i64> {
    let discriminant = match value {
        Value::Text(s) => match info.discriminant_of(s.trim()) {
            Some(d) => return Some(d),
            None => s.trim().parse::<i64>().ok()?,
        },
        other => i64::try_from(to_integer(other)?).ok()?,
    };
    info.has_discriminant(discriminant).then_some(discriminant)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLOURS: EnumInfo = EnumInfo {
        name: "Colour",
        members: &[("Red", 1), ("Green", 2)],
    };

    #[test]
    fn test_null_converts_to_unset() {
        assert_eq!(convert(&Value::Null, ValueKind::Int32).unwrap(), None);
        assert_eq!(convert(&Value::Null, ValueKind::Text).unwrap(), None);
    }

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(
            change_type(&Value::Int(127), ValueKind::Int8).unwrap(),
            Value::Int(127)
        );
        assert!(change_type(&Value::Int(128), ValueKind::Int8).is_err());
        assert!(change_type(&Value::Int(-1), ValueKind::UInt32).is_err());
        assert_eq!(
            change_type(&Value::Text(" 42 ".to_string()), ValueKind::UInt16).unwrap(),
            Value::UInt(42)
        );
    }

    #[test]
    fn test_float_to_integer_rounds_to_even() {
        assert_eq!(
            change_type(&Value::Float(2.5), ValueKind::Int32).unwrap(),
            Value::Int(2)
        );
        assert_eq!(
            change_type(&Value::Float(3.5), ValueKind::Int32).unwrap(),
            Value::Int(4)
        );
        assert!(change_type(&Value::Float(f64::NAN), ValueKind::Int64).is_err());
    }

    #[test]
    fn test_text_conversions() {
        assert_eq!(
            change_type(&Value::Int(5), ValueKind::Text).unwrap(),
            Value::Text("5".to_string())
        );
        assert_eq!(
            change_type(&Value::Text("TRUE".to_string()), ValueKind::Bool).unwrap(),
            Value::Bool(true)
        );
        assert!(change_type(&Value::Text("yes".to_string()), ValueKind::Bool).is_err());
        assert!(change_type(&Value::Bytes(vec![1]), ValueKind::Text).is_err());
    }

    #[test]
    fn test_temporal_conversions() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            change_type(&Value::Text("2024-03-01".to_string()), ValueKind::Date).unwrap(),
            Value::Date(date)
        );
        assert_eq!(
            change_type(&Value::Text("2024-03-01 10:30:00".to_string()), ValueKind::DateTime)
                .unwrap(),
            Value::DateTime(date.and_hms_opt(10, 30, 0).unwrap())
        );
        assert_eq!(
            change_type(&Value::Date(date), ValueKind::Timestamp).unwrap(),
            Value::Timestamp(date.and_time(NaiveTime::MIN).and_utc())
        );
    }

    #[test]
    fn test_enum_conversion() {
        let kind = ValueKind::Enum(COLOURS);
        assert_eq!(
            change_type(&Value::Text("Green".to_string()), kind).unwrap(),
            Value::Int(2)
        );
        assert_eq!(change_type(&Value::Int(1), kind).unwrap(), Value::Int(1));
        assert_eq!(
            change_type(&Value::Text("1".to_string()), kind).unwrap(),
            Value::Int(1)
        );
        assert!(change_type(&Value::Text("Blue".to_string()), kind).is_err());
        assert!(change_type(&Value::Int(9), kind).is_err());
    }

    #[test]
    fn test_stream_requires_bytes() {
        assert_eq!(
            change_type(&Value::Bytes(vec![1, 2]), ValueKind::Stream).unwrap(),
            Value::Bytes(vec![1, 2])
        );
        let err = change_type(&Value::Int(1), ValueKind::Stream).unwrap_err();
        assert_eq!(err.target_type, "stream");
        assert!(err.to_string().contains("stream"));
    }
}
