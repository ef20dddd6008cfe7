//! Schema-driven encode/decode traversal.
//!
//! Wire format of one struct:
//! ```text
//! [field_1][field_2]...[field_N]
//! ```
//! Fields appear in declaration order with no tags or framing.  Each field is
//! encoded by the codec its [`WireType`] selects:
//!
//! | wire type      | bytes                                  |
//! |----------------|----------------------------------------|
//! | fixed scalar   | its width, little-endian               |
//! | `Text`         | `[len:u16][utf8 bytes]`                |
//! | `Nested`       | the nested struct's encoding, inline   |
//! | `Array`        | `[count:u16][elem]...`                 |
//! | `Map`          | `[count:u16][key][value]...`           |
//!
//! [`encode_value`] and [`decode_value`] are the single dispatch point from
//! wire type to codec.

use crate::protocol::cursor::{ReadCursor, WriteCursor};
use crate::protocol::error::{CodecError, Result};
use crate::protocol::scalar::{
    decode_text, encode_text, int_to_f64, narrow_f32, narrow_int, Scalar,
};
use crate::protocol::schema::{Schema, SchemaRegistry, WireType};
use crate::protocol::value::{Fields, Value};

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes `fields` in the order `schema` declares them.
///
/// Values not named by the schema are ignored.
pub fn encode_struct(
    registry: &SchemaRegistry,
    schema: &Schema,
    mut fields: Fields,
    out: &mut WriteCursor,
) -> Result<()> {
    for decl in schema.fields() {
        let value = fields
            .remove(decl.name)
            .ok_or(CodecError::MissingField(decl.name))?;
        encode_value(registry, &decl.wire, value, decl.name, out)?;
    }
    Ok(())
}

/// Encodes one value as `wire`.  `field` is used for error context only.
pub fn encode_value(
    registry: &SchemaRegistry,
    wire: &WireType,
    value: Value,
    field: &'static str,
    out: &mut WriteCursor,
) -> Result<()> {
    match (wire, value) {
        (WireType::Int8, Value::Int(v)) => narrow_int::<i8>(v, "Int8")?.encode(out),
        (WireType::Int16, Value::Int(v)) => narrow_int::<i16>(v, "Int16")?.encode(out),
        (WireType::Int32, Value::Int(v)) => narrow_int::<i32>(v, "Int32")?.encode(out),
        (WireType::UInt8, Value::Int(v)) => narrow_int::<u8>(v, "UInt8")?.encode(out),
        (WireType::UInt16, Value::Int(v)) => narrow_int::<u16>(v, "UInt16")?.encode(out),
        (WireType::UInt32, Value::Int(v)) => narrow_int::<u32>(v, "UInt32")?.encode(out),
        (WireType::Float32, Value::Float(v)) => narrow_f32(v)?.encode(out),
        (WireType::Float32, Value::Int(v)) => narrow_f32(int_to_f64(v, "Float32")?)?.encode(out),
        (WireType::Float64, Value::Float(v)) => v.encode(out),
        (WireType::Float64, Value::Int(v)) => int_to_f64(v, "Float64")?.encode(out),
        (WireType::Text, Value::Text(s)) => encode_text(&s, out)?,
        (WireType::Nested(ty), Value::Struct(nested)) => {
            let schema = registry.resolve(*ty)?;
            encode_struct(registry, &schema, nested, out)?;
        }
        (WireType::Array(element), Value::Array(items)) => {
            out.write_len(items.len())?;
            for item in items {
                encode_value(registry, element, item, field, out)?;
            }
        }
        (WireType::Map(key, val), Value::Map(entries)) => {
            out.write_len(entries.len())?;
            for (k, v) in entries {
                encode_value(registry, key, k, field, out)?;
                encode_value(registry, val, v, field, out)?;
            }
        }
        (wire, value) => {
            return Err(CodecError::TypeMismatch {
                field,
                expected: wire.name(),
                found: value.kind(),
            })
        }
    }
    Ok(())
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decodes the fields `schema` declares, in order.
pub fn decode_struct(
    registry: &SchemaRegistry,
    schema: &Schema,
    cursor: &mut ReadCursor<'_>,
) -> Result<Fields> {
    let mut fields = Fields::new();
    for decl in schema.fields() {
        let value = decode_value(registry, &decl.wire, cursor)?;
        fields.insert(decl.name, value);
    }
    Ok(fields)
}

/// Decodes one value of type `wire`.
pub fn decode_value(
    registry: &SchemaRegistry,
    wire: &WireType,
    cursor: &mut ReadCursor<'_>,
) -> Result<Value> {
    let value = match wire {
        WireType::Int8 => Value::Int(i8::decode(cursor)?.into()),
        WireType::Int16 => Value::Int(i16::decode(cursor)?.into()),
        WireType::Int32 => Value::Int(i32::decode(cursor)?.into()),
        WireType::UInt8 => Value::Int(u8::decode(cursor)?.into()),
        WireType::UInt16 => Value::Int(u16::decode(cursor)?.into()),
        WireType::UInt32 => Value::Int(u32::decode(cursor)?.into()),
        WireType::Float32 => Value::Float(f32::decode(cursor)?.into()),
        WireType::Float64 => Value::Float(f64::decode(cursor)?),
        WireType::Text => Value::Text(decode_text(cursor)?),
        WireType::Nested(ty) => {
            let schema = registry.resolve(*ty)?;
            Value::Struct(decode_struct(registry, &schema, cursor)?)
        }
        WireType::Array(element) => {
            let min = registry.min_encoded_len(element)?;
            let count = read_count(cursor, min)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value(registry, element, cursor)?);
            }
            Value::Array(items)
        }
        WireType::Map(key, val) => {
            let min = registry.min_encoded_len(key)? + registry.min_encoded_len(val)?;
            let count = read_count(cursor, min)?;
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                let k = decode_value(registry, key, cursor)?;
                let v = decode_value(registry, val, cursor)?;
                entries.push((k, v));
            }
            Value::Map(entries)
        }
    };
    Ok(value)
}

/// Reads a collection count and rejects it before allocating if even the
/// smallest possible elements could not fit in the bytes that remain.
///
/// A count larger than the remaining byte count is a corrupt prefix
/// ([`CodecError::LengthOverflow`]).  A plausible count whose elements still
/// need more bytes than remain means the stream ended early
/// ([`CodecError::TruncatedInput`], in bytes).
fn read_count(cursor: &mut ReadCursor<'_>, min_element_len: usize) -> Result<usize> {
    let count = cursor.read_len()?;
    let remaining = cursor.remaining();
    // zero-width elements (empty structs) fit any count
    if min_element_len > 0 && count > remaining {
        return Err(CodecError::LengthOverflow {
            declared: count,
            remaining,
        });
    }
    let needed = count.saturating_mul(min_element_len);
    if needed > remaining {
        return Err(CodecError::TruncatedInput {
            needed,
            available: remaining,
        });
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(wire: &WireType, value: Value) -> Result<Vec<u8>> {
        let registry = SchemaRegistry::new();
        let mut out = WriteCursor::new();
        encode_value(&registry, wire, value, "test", &mut out)?;
        Ok(out.into_inner())
    }

    fn decode(wire: &WireType, bytes: &[u8]) -> Result<Value> {
        let registry = SchemaRegistry::new();
        let mut cur = ReadCursor::new(bytes);
        let value = decode_value(&registry, wire, &mut cur)?;
        assert!(cur.is_empty(), "decode must consume every byte it was given");
        Ok(value)
    }

    #[test]
    fn test_int8_array_layout() {
        let wire = WireType::array(WireType::Int8);
        let value = Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let bytes = encode(&wire, value.clone()).unwrap();
        assert_eq!(bytes, vec![0x03, 0x00, 0x01, 0x02, 0x03]);
        assert_eq!(decode(&wire, &bytes).unwrap(), value);
    }

    #[test]
    fn test_empty_array() {
        let wire = WireType::array(WireType::Text);
        let bytes = encode(&wire, Value::Array(vec![])).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00]);
        assert_eq!(decode(&wire, &bytes).unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_nested_arrays() {
        let wire = WireType::array(WireType::array(WireType::UInt16));
        let value = Value::Array(vec![
            Value::Array(vec![Value::Int(1)]),
            Value::Array(vec![]),
            Value::Array(vec![Value::Int(65_535), Value::Int(0)]),
        ]);
        let bytes = encode(&wire, value.clone()).unwrap();
        assert_eq!(decode(&wire, &bytes).unwrap(), value);
    }

    #[test]
    fn test_map_layout_keeps_entry_order() {
        let wire = WireType::map(WireType::Text, WireType::Int32);
        let value = Value::map([("b", 2i32), ("a", 1)]);
        let bytes = encode(&wire, value.clone()).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x02, 0x00, // count
                0x01, 0x00, b'b', 0x02, 0x00, 0x00, 0x00, // "b" => 2
                0x01, 0x00, b'a', 0x01, 0x00, 0x00, 0x00, // "a" => 1
            ]
        );
        assert_eq!(decode(&wire, &bytes).unwrap(), value);
    }

    #[test]
    fn test_map_duplicate_keys_survive_decoding() {
        let wire = WireType::map(WireType::UInt8, WireType::UInt8);
        let value = Value::Map(vec![
            (Value::Int(1), Value::Int(10)),
            (Value::Int(1), Value::Int(20)),
        ]);
        let bytes = encode(&wire, value.clone()).unwrap();
        assert_eq!(decode(&wire, &bytes).unwrap(), value);
    }

    #[test]
    fn test_out_of_range_scalar_fails() {
        assert!(matches!(
            encode(&WireType::Int8, Value::Int(128)),
            Err(CodecError::ValueOutOfRange { target: "Int8", .. })
        ));
        assert!(matches!(
            encode(&WireType::UInt16, Value::Int(-1)),
            Err(CodecError::ValueOutOfRange { target: "UInt16", .. })
        ));
        assert!(matches!(
            encode(&WireType::Float32, Value::Float(f64::MAX)),
            Err(CodecError::ValueOutOfRange { target: "Float32", .. })
        ));
    }

    #[test]
    fn test_out_of_range_inside_array_fails() {
        let wire = WireType::array(WireType::UInt8);
        let value = Value::Array(vec![Value::Int(1), Value::Int(256)]);
        assert!(matches!(
            encode(&wire, value),
            Err(CodecError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_float_fields_accept_integers() {
        let bytes = encode(&WireType::Float32, Value::Int(32)).unwrap();
        assert_eq!(bytes, 32.0f32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_wrong_value_kind_is_type_mismatch() {
        assert_eq!(
            encode(&WireType::Text, Value::Int(5)),
            Err(CodecError::TypeMismatch {
                field: "test",
                expected: "Text",
                found: "Int"
            })
        );
    }

    #[test]
    fn test_array_ending_early_is_truncated_input_in_bytes() {
        let wire = WireType::array(WireType::Int32);
        // 2 elements declared, 4 bytes present, 8 needed
        let bytes = [0x02, 0x00, 0x01, 0x00, 0x00, 0x00];
        let registry = SchemaRegistry::new();
        let err = decode_value(&registry, &wire, &mut ReadCursor::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                needed: 8,
                available: 4
            }
        );
    }

    #[test]
    fn test_int32_array_missing_last_byte() {
        let wire = WireType::array(WireType::Int32);
        let value = Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let bytes = encode(&wire, value).unwrap();
        let registry = SchemaRegistry::new();
        let cut = &bytes[..bytes.len() - 1];
        let err = decode_value(&registry, &wire, &mut ReadCursor::new(cut)).unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                needed: 12,
                available: 11
            }
        );
    }

    #[test]
    fn test_array_count_exceeding_remaining_bytes_is_length_overflow() {
        let wire = WireType::array(WireType::Int8);
        let bytes = [0x05, 0x00, 0x01, 0x02];
        let registry = SchemaRegistry::new();
        let err = decode_value(&registry, &wire, &mut ReadCursor::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            CodecError::LengthOverflow {
                declared: 5,
                remaining: 2
            }
        );
    }

    #[test]
    fn test_map_count_exceeding_remaining_is_length_overflow() {
        let wire = WireType::map(WireType::Text, WireType::Int8);
        let bytes = [0xFF, 0xFF, 0x00, 0x00, 0x01];
        let registry = SchemaRegistry::new();
        let err = decode_value(&registry, &wire, &mut ReadCursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, CodecError::LengthOverflow { declared: 0xFFFF, .. }));
    }

    #[test]
    fn test_int_into_float64_must_be_exact() {
        let exact = 1i64 << 53;
        let bytes = encode(&WireType::Float64, Value::Int(exact)).unwrap();
        assert_eq!(
            decode(&WireType::Float64, &bytes).unwrap(),
            Value::Float(exact as f64)
        );
        assert_eq!(
            encode(&WireType::Float64, Value::Int(exact + 1)),
            Err(CodecError::ValueOutOfRange {
                target: "Float64",
                value: (exact + 1).to_string()
            })
        );
    }

    #[test]
    fn test_truncated_scalar() {
        let registry = SchemaRegistry::new();
        let err = decode_value(&registry, &WireType::Float64, &mut ReadCursor::new(&[0; 7]))
            .unwrap_err();
        assert_eq!(
            err,
            CodecError::TruncatedInput {
                needed: 8,
                available: 7
            }
        );
    }
}
