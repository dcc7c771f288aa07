// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA value ↔ JSON conversion.
//!
//! Readings leave the sensor as JSON scalars and commands arrive as JSON, so
//! this module is the only place where the two type systems meet.
//!
//! # Write encoding
//!
//! ```text
//! JSON                           OPC UA
//! ─────────────────────────────  ───────────────────────────────
//! true / false                   Boolean
//! "text"                         String
//! 11, 2.5                        Double
//! integer beyond ±2^53           Int64 / UInt64
//! {"type": "Int16", "value": 5}  the named type, range checked
//! null, [...], {...}             rejected
//! ```

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::error::{ConversionError, OpcUaError, OpcUaResult};
use crate::types::OpcUaDataType;

use super::transport::OpcUaValue;

/// Largest integer a JSON double represents exactly.
const MAX_SAFE_INTEGER: u64 = 1 << 53;

// =============================================================================
// OPC UA → JSON
// =============================================================================

/// Converts a value read from the server into a JSON value.
///
/// Non-finite floats become `null`, byte strings are base64 encoded and
/// timestamps use RFC 3339.
pub fn to_json(value: &OpcUaValue) -> Value {
    match value {
        OpcUaValue::Boolean(v) => Value::Bool(*v),
        OpcUaValue::SByte(v) => Value::from(*v),
        OpcUaValue::Byte(v) => Value::from(*v),
        OpcUaValue::Int16(v) => Value::from(*v),
        OpcUaValue::UInt16(v) => Value::from(*v),
        OpcUaValue::Int32(v) => Value::from(*v),
        OpcUaValue::UInt32(v) => Value::from(*v),
        OpcUaValue::Int64(v) => Value::from(*v),
        OpcUaValue::UInt64(v) => Value::from(*v),
        OpcUaValue::Float(v) => float_to_json(*v as f64),
        OpcUaValue::Double(v) => float_to_json(*v),
        OpcUaValue::String(v) => Value::String(v.clone()),
        OpcUaValue::DateTime(v) => Value::String(v.to_rfc3339()),
        OpcUaValue::Guid(v) => Value::String(v.to_string()),
        OpcUaValue::ByteString(v) => Value::String(BASE64.encode(v)),
        OpcUaValue::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        OpcUaValue::Null => Value::Null,
    }
}

/// Converts an optional value, mapping a missing value to `null`.
pub fn option_to_json(value: Option<&OpcUaValue>) -> Value {
    value.map(to_json).unwrap_or(Value::Null)
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

// =============================================================================
// JSON → OPC UA
// =============================================================================

/// Encodes a JSON command value for a write to `node_id`.
///
/// # Errors
///
/// Returns [`ConversionError::Unencodable`] for `null`, arrays and objects
/// other than the typed form, and [`ConversionError::OutOfRange`] when a
/// typed value does not fit its type.
pub fn encode_write_value(node_id: &str, value: &Value) -> OpcUaResult<OpcUaValue> {
    match value {
        Value::Bool(v) => Ok(OpcUaValue::Boolean(*v)),
        Value::String(v) => Ok(OpcUaValue::String(v.clone())),
        Value::Number(n) => Ok(encode_number(n)),
        Value::Object(map) => encode_typed(node_id, map),
        Value::Null => Err(unencodable(node_id, "null has no OPC UA representation")),
        Value::Array(_) => Err(unencodable(node_id, "arrays are not supported")),
    }
}

fn encode_number(n: &Number) -> OpcUaValue {
    if let Some(v) = n.as_i64() {
        if v.unsigned_abs() > MAX_SAFE_INTEGER {
            return OpcUaValue::Int64(v);
        }
    } else if let Some(v) = n.as_u64() {
        return OpcUaValue::UInt64(v);
    }
    // every other number is represented as f64
    OpcUaValue::Double(n.as_f64().unwrap_or_default())
}

fn encode_typed(node_id: &str, map: &Map<String, Value>) -> OpcUaResult<OpcUaValue> {
    let (Some(type_name), Some(value), 2) = (map.get("type"), map.get("value"), map.len()) else {
        return Err(unencodable(
            node_id,
            "objects must have exactly the keys \"type\" and \"value\"",
        ));
    };
    let type_name = type_name
        .as_str()
        .ok_or_else(|| unencodable(node_id, "\"type\" must be a string"))?;
    let data_type: OpcUaDataType = type_name
        .parse()
        .map_err(|_| unencodable(node_id, format!("unknown data type '{}'", type_name)))?;

    encode_as(node_id, data_type, value)
}

/// Encodes `value` as the given scalar data type.
pub fn encode_as(node_id: &str, data_type: OpcUaDataType, value: &Value) -> OpcUaResult<OpcUaValue> {
    let mismatch = || unencodable(node_id, format!("{} is not a valid {}", value, data_type));
    let out_of_range = || {
        OpcUaError::conversion(ConversionError::out_of_range(node_id, data_type, value))
    };

    if data_type.is_integer() {
        let int = integer_of(value).ok_or_else(mismatch)?;
        return match data_type {
            OpcUaDataType::SByte => i8::try_from(int).map(OpcUaValue::SByte).ok(),
            OpcUaDataType::Byte => u8::try_from(int).map(OpcUaValue::Byte).ok(),
            OpcUaDataType::Int16 => i16::try_from(int).map(OpcUaValue::Int16).ok(),
            OpcUaDataType::UInt16 => u16::try_from(int).map(OpcUaValue::UInt16).ok(),
            OpcUaDataType::Int32 => i32::try_from(int).map(OpcUaValue::Int32).ok(),
            OpcUaDataType::UInt32 => u32::try_from(int).map(OpcUaValue::UInt32).ok(),
            OpcUaDataType::Int64 => i64::try_from(int).map(OpcUaValue::Int64).ok(),
            _ => u64::try_from(int).map(OpcUaValue::UInt64).ok(),
        }
        .ok_or_else(out_of_range);
    }

    match data_type {
        OpcUaDataType::Boolean => value.as_bool().map(OpcUaValue::Boolean).ok_or_else(mismatch),
        OpcUaDataType::Float => {
            let v = value.as_f64().ok_or_else(mismatch)?;
            if v.abs() > f32::MAX as f64 {
                return Err(out_of_range());
            }
            Ok(OpcUaValue::Float(v as f32))
        }
        OpcUaDataType::Double => value.as_f64().map(OpcUaValue::Double).ok_or_else(mismatch),
        OpcUaDataType::String => value
            .as_str()
            .map(|s| OpcUaValue::String(s.to_string()))
            .ok_or_else(mismatch),
        OpcUaDataType::DateTime => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| OpcUaValue::DateTime(dt.with_timezone(&Utc)))
            .ok_or_else(mismatch),
        OpcUaDataType::Guid => value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(OpcUaValue::Guid)
            .ok_or_else(mismatch),
        OpcUaDataType::ByteString => value
            .as_str()
            .and_then(|s| BASE64.decode(s).ok())
            .map(OpcUaValue::ByteString)
            .ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

/// Extracts an integer, accepting floats without a fractional part.
fn integer_of(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(v) = n.as_i64() {
        return Some(v as i128);
    }
    if let Some(v) = n.as_u64() {
        return Some(v as i128);
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f.abs() < 1.9e19).then_some(f as i128)
}

fn unencodable(node_id: &str, reason: impl Into<String>) -> OpcUaError {
    OpcUaError::conversion(ConversionError::unencodable(node_id, reason))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_scalars() {
        assert_eq!(to_json(&OpcUaValue::Double(11.0)), json!(11.0));
        assert_eq!(to_json(&OpcUaValue::Int32(-3)), json!(-3));
        assert_eq!(to_json(&OpcUaValue::Boolean(true)), json!(true));
        assert_eq!(to_json(&OpcUaValue::String("on".into())), json!("on"));
        assert_eq!(to_json(&OpcUaValue::Double(f64::NAN)), Value::Null);
        assert_eq!(to_json(&OpcUaValue::ByteString(vec![1, 2, 3, 4])), json!("AQIDBA=="));
        assert_eq!(option_to_json(None), Value::Null);
    }

    #[test]
    fn test_to_json_array() {
        let value = OpcUaValue::Array(vec![OpcUaValue::Int16(1), OpcUaValue::Null]);
        assert_eq!(to_json(&value), json!([1, null]));
    }

    #[test]
    fn test_encode_plain_values() {
        assert_eq!(encode_write_value("n", &json!(11)).unwrap(), OpcUaValue::Double(11.0));
        assert_eq!(encode_write_value("n", &json!(2.5)).unwrap(), OpcUaValue::Double(2.5));
        assert_eq!(encode_write_value("n", &json!(false)).unwrap(), OpcUaValue::Boolean(false));
        assert_eq!(
            encode_write_value("n", &json!("hi")).unwrap(),
            OpcUaValue::String("hi".into())
        );
    }

    #[test]
    fn test_encode_large_integers() {
        let big = (1_i64 << 53) + 1;
        assert_eq!(encode_write_value("n", &json!(big)).unwrap(), OpcUaValue::Int64(big));
        assert_eq!(encode_write_value("n", &json!(-big)).unwrap(), OpcUaValue::Int64(-big));
        assert_eq!(
            encode_write_value("n", &json!(u64::MAX)).unwrap(),
            OpcUaValue::UInt64(u64::MAX)
        );
        assert_eq!(
            encode_write_value("n", &json!(1_i64 << 53)).unwrap(),
            OpcUaValue::Double(9007199254740992.0)
        );
    }

    #[test]
    fn test_encode_typed() {
        let v = encode_write_value("n", &json!({"type": "Int16", "value": 5})).unwrap();
        assert_eq!(v, OpcUaValue::Int16(5));

        let v = encode_write_value("n", &json!({"type": "uint32", "value": 7.0})).unwrap();
        assert_eq!(v, OpcUaValue::UInt32(7));

        let v = encode_write_value("n", &json!({"type": "Float", "value": 1.5})).unwrap();
        assert_eq!(v, OpcUaValue::Float(1.5));

        let v = encode_write_value(
            "n",
            &json!({"type": "Guid", "value": "550e8400-e29b-41d4-a716-446655440000"}),
        )
        .unwrap();
        assert!(matches!(v, OpcUaValue::Guid(_)));
    }

    #[test]
    fn test_encode_typed_out_of_range() {
        let err = encode_write_value("n", &json!({"type": "Byte", "value": 300})).unwrap_err();
        assert!(matches!(
            err,
            OpcUaError::Conversion(ConversionError::OutOfRange { .. })
        ));

        let err = encode_write_value("n", &json!({"type": "UInt16", "value": -1})).unwrap_err();
        assert!(matches!(
            err,
            OpcUaError::Conversion(ConversionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_unencodable() {
        for value in [
            json!(null),
            json!([1, 2]),
            json!({"a": 1}),
            json!({"type": "Variant", "value": 1}),
            json!({"type": "Int32", "value": "x"}),
            json!({"type": "Int32", "value": 1.5}),
            json!({"type": "Int32", "value": 1, "extra": true}),
        ] {
            let err = encode_write_value("ns=2;i=3", &value).unwrap_err();
            assert!(
                matches!(err, OpcUaError::Conversion(ConversionError::Unencodable { .. })),
                "{value}: {err}"
            );
        }
    }
}
