//! The tagged value type shared by every document and context.
//!
//! `TaggedValue` is a closed sum over the JSON data model with integers and
//! floating-point numbers kept apart. Decoding discriminates variants in a
//! fixed order -- null, bool, int, double, string, array, object -- so a
//! bare `42` becomes `Int(42)`, `42.5` becomes `Double(42.5)` and `"42"`
//! stays a `String`.
//!
//! The `as_*` accessors are lossy, directional coercions that return `None`
//! rather than failing. Prop values are routinely authored as string-typed
//! numbers, so `String("3")` answers `as_int() == Some(3)`.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodecError;

/// Object payload of a [`TaggedValue`]. Key order carries no meaning.
pub type ValueMap = BTreeMap<String, TaggedValue>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TaggedValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Array(Vec<TaggedValue>),
    Object(ValueMap),
    #[default]
    Null,
}

impl TaggedValue {
    /// Returns a human-readable variant name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            TaggedValue::String(_) => "String",
            TaggedValue::Int(_) => "Int",
            TaggedValue::Double(_) => "Double",
            TaggedValue::Bool(_) => "Bool",
            TaggedValue::Array(_) => "Array",
            TaggedValue::Object(_) => "Object",
            TaggedValue::Null => "Null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TaggedValue::Null)
    }

    /// Borrow the payload of a `String` variant. No coercion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TaggedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar-to-string coercion.
    ///
    /// `Int(42)` gives `"42"`, `Bool(true)` gives `"true"`, doubles use
    /// [`format_double`]. Arrays, objects and null have no string form.
    pub fn as_string(&self) -> Option<String> {
        match self {
            TaggedValue::String(s) => Some(s.clone()),
            TaggedValue::Int(i) => Some(i.to_string()),
            TaggedValue::Double(d) => Some(format_double(*d)),
            TaggedValue::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
            _ => None,
        }
    }

    /// Integer coercion. Doubles truncate toward zero; strings must be a
    /// valid integer literal.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TaggedValue::Int(i) => Some(*i),
            TaggedValue::Double(d) => {
                if d.is_finite() && *d >= i64::MIN as f64 && *d < i64::MAX as f64 {
                    Some(d.trunc() as i64)
                } else {
                    None
                }
            }
            TaggedValue::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            TaggedValue::Double(d) => Some(*d),
            TaggedValue::Int(i) => Some(*i as f64),
            TaggedValue::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Boolean coercion. Integers are true when nonzero; the only string
    /// that reads as true is `"true"`, every other string reads as false.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TaggedValue::Bool(b) => Some(*b),
            TaggedValue::Int(i) => Some(*i != 0),
            TaggedValue::String(s) => Some(s == "true"),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[TaggedValue]> {
        match self {
            TaggedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            TaggedValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`. Non-finite doubles become null.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.clone())
    }

    fn check_finite(&self) -> Result<(), CodecError> {
        match self {
            TaggedValue::Double(d) if !d.is_finite() => Err(CodecError::NonFinite { value: *d }),
            TaggedValue::Array(items) => items.iter().try_for_each(TaggedValue::check_finite),
            TaggedValue::Object(map) => map.values().try_for_each(TaggedValue::check_finite),
            _ => Ok(()),
        }
    }
}

/// Display form used when a value is bound into text.
///
/// Scalars print like [`TaggedValue::as_string`], null prints as the empty
/// string, and containers print as compact JSON.
impl fmt::Display for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaggedValue::String(s) => f.write_str(s),
            TaggedValue::Int(i) => write!(f, "{}", i),
            TaggedValue::Double(d) => f.write_str(&format_double(*d)),
            TaggedValue::Bool(b) => write!(f, "{}", b),
            TaggedValue::Null => Ok(()),
            TaggedValue::Array(_) | TaggedValue::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Format a double the way authors expect to see it in bound text: whole
/// values keep a trailing `.0` (`3.0`), large magnitudes switch to an
/// exponent (`1e+16`), everything else uses the shortest round-trip form.
pub fn format_double(d: f64) -> String {
    if !d.is_finite() {
        return if d.is_nan() {
            "nan".to_string()
        } else if d > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    if d != 0.0 && d.abs() >= 1e16 {
        let formatted = format!("{:e}", d);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    if d.fract() == 0.0 {
        format!("{:.1}", d)
    } else {
        d.to_string()
    }
}

// ──────────────────────────────────────────────
// Codec
// ──────────────────────────────────────────────

/// Decode JSON bytes into a tagged value.
pub fn decode(bytes: &[u8]) -> Result<TaggedValue, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Encode a tagged value as compact JSON bytes.
///
/// Fails only for NaN or infinite doubles, which JSON cannot carry.
pub fn encode(value: &TaggedValue) -> Result<Vec<u8>, CodecError> {
    value.check_finite()?;
    Ok(serde_json::to_vec(value)?)
}

impl Serialize for TaggedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TaggedValue::String(s) => serializer.serialize_str(s),
            TaggedValue::Int(i) => serializer.serialize_i64(*i),
            TaggedValue::Double(d) => serializer.serialize_f64(*d),
            TaggedValue::Bool(b) => serializer.serialize_bool(*b),
            TaggedValue::Null => serializer.serialize_unit(),
            TaggedValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            TaggedValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct TaggedValueVisitor;

impl<'de> Visitor<'de> for TaggedValueVisitor {
    type Value = TaggedValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<TaggedValue, E> {
        Ok(TaggedValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<TaggedValue, E> {
        Ok(TaggedValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<TaggedValue, D::Error> {
        TaggedValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<TaggedValue, E> {
        Ok(TaggedValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TaggedValue, E> {
        Ok(TaggedValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TaggedValue, E> {
        // Unsigned literals beyond i64 do not fit an Int and fall to Double.
        Ok(match i64::try_from(v) {
            Ok(i) => TaggedValue::Int(i),
            Err(_) => TaggedValue::Double(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TaggedValue, E> {
        Ok(TaggedValue::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TaggedValue, E> {
        Ok(TaggedValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<TaggedValue, E> {
        Ok(TaggedValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TaggedValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(TaggedValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TaggedValue, A::Error> {
        let mut map = ValueMap::new();
        while let Some((k, v)) = access.next_entry::<String, TaggedValue>()? {
            map.insert(k, v);
        }
        Ok(TaggedValue::Object(map))
    }
}

impl<'de> Deserialize<'de> for TaggedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TaggedValueVisitor)
    }
}

// ──────────────────────────────────────────────
// Conversions
// ──────────────────────────────────────────────

impl From<serde_json::Value> for TaggedValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => TaggedValue::Null,
            serde_json::Value::Bool(b) => TaggedValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    TaggedValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    TaggedValue::Double(f)
                } else {
                    TaggedValue::Null
                }
            }
            serde_json::Value::String(s) => TaggedValue::String(s),
            serde_json::Value::Array(arr) => {
                TaggedValue::Array(arr.into_iter().map(TaggedValue::from).collect())
            }
            serde_json::Value::Object(obj) => TaggedValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, TaggedValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<TaggedValue> for serde_json::Value {
    fn from(v: TaggedValue) -> Self {
        match v {
            TaggedValue::Null => serde_json::Value::Null,
            TaggedValue::Bool(b) => serde_json::Value::Bool(b),
            TaggedValue::Int(i) => serde_json::Value::Number(i.into()),
            TaggedValue::Double(d) => serde_json::Number::from_f64(d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            TaggedValue::String(s) => serde_json::Value::String(s),
            TaggedValue::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            TaggedValue::Object(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for TaggedValue {
    fn from(s: &str) -> Self {
        TaggedValue::String(s.to_string())
    }
}

impl From<String> for TaggedValue {
    fn from(s: String) -> Self {
        TaggedValue::String(s)
    }
}

impl From<i64> for TaggedValue {
    fn from(i: i64) -> Self {
        TaggedValue::Int(i)
    }
}

impl From<f64> for TaggedValue {
    fn from(d: f64) -> Self {
        TaggedValue::Double(d)
    }
}

impl From<bool> for TaggedValue {
    fn from(b: bool) -> Self {
        TaggedValue::Bool(b)
    }
}

impl From<Vec<TaggedValue>> for TaggedValue {
    fn from(items: Vec<TaggedValue>) -> Self {
        TaggedValue::Array(items)
    }
}

impl From<ValueMap> for TaggedValue {
    fn from(map: ValueMap) -> Self {
        TaggedValue::Object(map)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
