//! In-memory values the codec walks, and conversions to and from Rust types.
//!
//! A [`Value`] is deliberately loose: every integer is an `i64` and every
//! float an `f64`.  The field's [`WireType`](crate::protocol::schema::WireType)
//! decides the width on the wire, which is where out-of-range values are
//! caught.

use std::collections::BTreeMap;

use crate::protocol::error::{CodecError, Result};
use crate::protocol::message::WireStruct;
use crate::protocol::scalar::{narrow_f32, narrow_int};

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Struct(Fields),
    Array(Vec<Value>),
    /// Entries in wire order.  Duplicate keys are kept as-is.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Text(_) => "Text",
            Value::Struct(_) => "Struct",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
        }
    }

    /// Wraps a nested struct.
    pub fn from_struct<T: WireStruct>(value: &T) -> Value {
        Value::Struct(value.to_fields())
    }

    /// Builds an array of nested structs.
    pub fn from_structs<T: WireStruct>(values: &[T]) -> Value {
        Value::Array(values.iter().map(Value::from_struct).collect())
    }

    /// Builds a map whose wire order is the iteration order of `entries`.
    pub fn map<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToValue,
        V: ToValue,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }
}

// ── Field container ───────────────────────────────────────────────────────────

/// Named field values of one struct instance.
///
/// Wire order comes from the struct's schema, not from this container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: BTreeMap<&'static str, Value>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for `to_fields` implementations.
    pub fn with<T: ToValue + ?Sized>(mut self, name: &'static str, value: &T) -> Self {
        self.values.insert(name, value.to_value());
        self
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&mut self, name: &'static str, value: Value) -> Option<Value> {
        self.values.insert(name, value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Removes a field and converts it to `T`.
    ///
    /// # Errors
    ///
    /// [`CodecError::MissingField`] if absent, otherwise any conversion error.
    pub fn take<T: FromValue>(&mut self, name: &'static str) -> Result<T> {
        let value = self.remove(name).ok_or(CodecError::MissingField(name))?;
        T::from_value(value, name)
    }

    /// Removes a nested struct field and rebuilds it.
    pub fn take_struct<T: WireStruct>(&mut self, name: &'static str) -> Result<T> {
        let fields: Fields = self.take(name)?;
        T::from_fields(fields)
    }

    /// Removes an array-of-structs field and rebuilds each element.
    pub fn take_structs<T: WireStruct>(&mut self, name: &'static str) -> Result<Vec<T>> {
        let items: Vec<Fields> = self.take(name)?;
        items.into_iter().map(T::from_fields).collect()
    }

    /// Removes a map field as an ordered list of entries, keeping wire order
    /// and any duplicate keys.
    pub fn take_entries<K: FromValue, V: FromValue>(
        &mut self,
        name: &'static str,
    ) -> Result<Vec<(K, V)>> {
        match self.remove(name).ok_or(CodecError::MissingField(name))? {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| -> Result<(K, V)> {
                    Ok((K::from_value(k, name)?, V::from_value(v, name)?))
                })
                .collect(),
            other => Err(mismatch(name, "Map", &other)),
        }
    }
}

fn mismatch(field: &'static str, expected: &'static str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        field,
        expected,
        found: found.kind(),
    }
}

// ── Rust → Value ──────────────────────────────────────────────────────────────

/// Converts a Rust value into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

macro_rules! int_to_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

int_to_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for Fields {
    fn to_value(&self) -> Value {
        Value::Struct(self.clone())
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

/// Encodes in ascending key order.
impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::map(self.iter())
    }
}

// ── Value → Rust ──────────────────────────────────────────────────────────────

/// Converts a decoded [`Value`] back into a Rust value.
///
/// `field` names the field being converted, for error context.
pub trait FromValue: Sized {
    fn from_value(value: Value, field: &'static str) -> Result<Self>;
}

macro_rules! int_from_value {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value, field: &'static str) -> Result<Self> {
                    match value {
                        Value::Int(v) => narrow_int(v, stringify!($ty)),
                        other => Err(mismatch(field, "Int", &other)),
                    }
                }
            }
        )*
    };
}

int_from_value!(i8, i16, i32, i64, u8, u16, u32);

impl FromValue for f64 {
    fn from_value(value: Value, field: &'static str) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(mismatch(field, "Float", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value, field: &'static str) -> Result<Self> {
        narrow_f32(f64::from_value(value, field)?)
    }
}

impl FromValue for String {
    fn from_value(value: Value, field: &'static str) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch(field, "Text", &other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value, _field: &'static str) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for Fields {
    fn from_value(value: Value, field: &'static str) -> Result<Self> {
        match value {
            Value::Struct(fields) => Ok(fields),
            other => Err(mismatch(field, "Struct", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value, field: &'static str) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| T::from_value(item, field))
                .collect(),
            other => Err(mismatch(field, "Array", &other)),
        }
    }
}

/// Duplicate keys resolve last-write-wins.
impl<K: FromValue + Ord, V: FromValue> FromValue for BTreeMap<K, V> {
    fn from_value(value: Value, field: &'static str) -> Result<Self> {
        match value {
            Value::Map(entries) => {
                let mut map = BTreeMap::new();
                for (k, v) in entries {
                    map.insert(K::from_value(k, field)?, V::from_value(v, field)?);
                }
                Ok(map)
            }
            other => Err(mismatch(field, "Map", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_widen_to_int() {
        assert_eq!(18i8.to_value(), Value::Int(18));
        assert_eq!(u32::MAX.to_value(), Value::Int(u32::MAX as i64));
    }

    #[test]
    fn test_take_missing_field() {
        let mut fields = Fields::new();
        assert_eq!(
            fields.take::<i32>("absent"),
            Err(CodecError::MissingField("absent"))
        );
    }

    #[test]
    fn test_take_narrows_with_range_check() {
        let mut fields = Fields::new().with("small", &300i32);
        assert!(matches!(
            fields.take::<u8>("small"),
            Err(CodecError::ValueOutOfRange { target: "u8", .. })
        ));
    }

    #[test]
    fn test_take_wrong_kind_is_type_mismatch() {
        let mut fields = Fields::new().with("name", "abc");
        assert_eq!(
            fields.take::<i32>("name"),
            Err(CodecError::TypeMismatch {
                field: "name",
                expected: "Int",
                found: "Text"
            })
        );
    }

    #[test]
    fn test_btreemap_encodes_in_key_order() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2i32);
        map.insert("a".to_string(), 1i32);
        assert_eq!(
            map.to_value(),
            Value::Map(vec![
                (Value::Text("a".into()), Value::Int(1)),
                (Value::Text("b".into()), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn test_btreemap_duplicate_keys_last_write_wins() {
        let value = Value::Map(vec![
            (Value::Text("k".into()), Value::Int(1)),
            (Value::Text("k".into()), Value::Int(2)),
        ]);
        let map = BTreeMap::<String, i32>::from_value(value, "m").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["k"], 2);
    }

    #[test]
    fn test_take_entries_keeps_order_and_duplicates() {
        let mut fields = Fields::new();
        fields.insert(
            "m",
            Value::map([("z", 1i32), ("a", 2), ("z", 3)]),
        );
        let entries: Vec<(String, i32)> = fields.take_entries("m").unwrap();
        assert_eq!(
            entries,
            vec![("z".to_string(), 1), ("a".to_string(), 2), ("z".to_string(), 3)]
        );
    }

    #[test]
    fn test_float_accepts_integer_value() {
        assert_eq!(f64::from_value(Value::Int(64), "f"), Ok(64.0));
        assert!(f32::from_value(Value::Float(1e300), "f").is_err());
    }
}
