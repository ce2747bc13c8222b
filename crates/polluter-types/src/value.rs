//! Fixture values and the ordered records that hold them.
//!
//! Every object in a fixture document is decoded into a [`Record`], an
//! explicit sequence of [`Field`]s kept in the order they appear in the
//! source text. Engines rely on that order to line up column lists with
//! their placeholders, so no map type is used anywhere in the model.
//!
//! Numbers are always `f64`, matching JSON numeric semantics. When a value
//! is serialized back out, integral numbers are written without a
//! fractional part so that `1` round-trips as `1` and not `1.0`. Numbers
//! must be finite: YAML `.inf` and `.nan` are rejected on decode, and a
//! non-finite number refuses to serialize.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};

/// Largest magnitude below which every integer is exactly representable as `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single fixture value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null` / YAML `~`.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number, always held as double precision.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// A nested object with its fields in source order.
    Object(Record),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Returns the nested record if this value is an object.
    pub const fn as_object(&self) -> Option<&Record> {
        match self {
            Self::Object(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the elements if this value is an array.
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the number as an `i64` when it is integral and exactly representable.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Number(number) => exact_integer(*number),
            _ => None,
        }
    }
}

/// Converts `number` to `i64` when it has no fractional part and lies within
/// the range where `f64` holds integers exactly.
#[allow(clippy::cast_possible_truncation)]
pub fn exact_integer(number: f64) -> Option<i64> {
    if number.fract() == 0.0 && number.abs() <= MAX_EXACT_INTEGER {
        Some(number as i64)
    } else {
        None
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(values: Vec<Self>) -> Self {
        Self::Array(values)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Object(record)
    }
}

/// One named value inside a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field (column, key) name.
    pub name: String,
    /// Field value.
    pub value: Value,
}

impl Field {
    /// Create a field.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered sequence of fields: one row, one document, or one nested object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    /// Create an empty record.
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field after all existing fields.
    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Iterate fields in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Iterate field names in source order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// First value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Vec<Field>> for Record {
    fn from(fields: Vec<Field>) -> Self {
        Self { fields }
    }
}

impl FromIterator<Field> for Record {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for Record {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Number(number) if !number.is_finite() => Err(ser::Error::custom(
                format_args!("number {number} is not finite"),
            )),
            Self::Number(number) => match exact_integer(*number) {
                Some(integer) => serializer.serialize_i64(integer),
                None => serializer.serialize_f64(*number),
            },
            Self::String(value) => serializer.serialize_str(value),
            Self::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            Self::Object(record) => record.serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Deserialization
// ---------------------------------------------------------------------------

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a fixture value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Bool(value))
    }

    // Integers are widened to f64 on purpose: fixtures follow JSON numeric semantics.
    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Value, E> {
        Ok(Value::Number(value as f64))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Value, E> {
        Ok(Value::Number(value as f64))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Value, E> {
        if value.is_finite() {
            Ok(Value::Number(value))
        } else {
            Err(E::custom(format_args!("number {value} is not finite")))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut values = Vec::new();
        while let Some(value) = seq.next_element()? {
            values.push(value);
        }
        Ok(Value::Array(values))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
        RecordVisitor.visit_map(map).map(Value::Object)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object of named fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Record, A::Error> {
        let mut fields = Vec::new();
        while let Some(name) = map.next_key::<String>()? {
            let value = map.next_value::<Value>()?;
            fields.push(Field { name, value });
        }
        Ok(Record { fields })
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn json_object_keeps_source_order() {
        let record: Record = serde_json::from_str(r#"{"zeta":1,"alpha":2,"mid":3}"#).unwrap();
        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn nested_objects_keep_source_order() {
        let value: Value =
            serde_json::from_str(r#"{"outer":{"b":true,"a":null},"list":[{"y":1,"x":2}]}"#)
                .unwrap();
        let record = value.as_object().unwrap();

        let outer = record.get("outer").and_then(Value::as_object).unwrap();
        assert_eq!(outer.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(outer.get("a"), Some(&Value::Null));

        let element = record
            .get("list")
            .and_then(Value::as_array)
            .and_then(|values| values.first())
            .and_then(Value::as_object)
            .unwrap();
        assert_eq!(element.names().collect::<Vec<_>>(), vec!["y", "x"]);
    }

    #[test]
    fn integers_decode_as_doubles() {
        let value: Value = serde_json::from_str("[1, -2, 3.5]").unwrap();
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Number(1.0),
                Value::Number(-2.0),
                Value::Number(3.5),
            ])
        );
    }

    #[test]
    fn yaml_mapping_matches_json_shape() {
        let yaml: Value = serde_yml::from_str("name: Roman\nid: 1\ntags:\n  - a\n  - b\n").unwrap();
        let json: Value =
            serde_json::from_str(r#"{"name":"Roman","id":1,"tags":["a","b"]}"#).unwrap();
        assert_eq!(yaml, json);
    }

    #[test]
    fn integral_numbers_serialize_without_fraction() {
        let value = Value::Array(vec![
            Value::Number(1.0),
            Value::Number(-7.0),
            Value::Number(2.5),
        ]);
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,-7,2.5]");
    }

    #[test]
    fn objects_serialize_in_source_order() {
        let record: Record = vec![
            Field::new("key", "value"),
            Field::new("count", 2.0),
            Field::new("active", true),
        ]
        .into();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"key":"value","count":2,"active":true}"#
        );
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for input in ["x: .inf", "x: -.inf", "x: .nan"] {
            let err = serde_yml::from_str::<Value>(input).unwrap_err();
            assert!(err.to_string().contains("not finite"), "{err}");
        }

        let err = serde_json::to_string(&Value::Number(f64::NAN)).unwrap_err();
        assert!(err.to_string().contains("not finite"), "{err}");
        let nested = Value::Array(vec![Value::Number(1.0), Value::Number(f64::INFINITY)]);
        assert!(serde_json::to_string(&nested).is_err());
    }

    #[test]
    fn exact_integer_limits() {
        assert_eq!(exact_integer(42.0), Some(42));
        assert_eq!(exact_integer(-0.0), Some(0));
        assert_eq!(exact_integer(0.5), None);
        assert_eq!(exact_integer(f64::NAN), None);
        assert_eq!(exact_integer(f64::INFINITY), None);
        assert_eq!(exact_integer(1e300), None);
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::Number(1.0).kind(), "number");
        assert_eq!(Value::Object(Record::new()).kind(), "object");
        assert_eq!(Value::Number(3.0).as_integer(), Some(3));
        assert_eq!(Value::from("3").as_integer(), None);
    }
}
