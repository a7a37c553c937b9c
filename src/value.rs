//! Dynamic value representation for JSON data.
//!
//! This module provides the [`Value`] enum, a tree of dynamically-typed JSON
//! values, and [`Number`], the numeric leaf.
//!
//! ## Access Policy
//!
//! `Value` separates three ways of reaching a child, so that reading a tree can
//! never change it by accident:
//!
//! | Operation | Missing key | Wrong variant |
//! |---|---|---|
//! | [`get`](Value::get), `value["key"]` | `None` / shared `Null` | `None` / shared `Null` |
//! | [`at`](Value::at), [`get_as`](Value::get_as) | [`Error::MissingField`] | [`Error::TypeMismatch`] |
//! | [`entry`](Value::entry), `value["key"] = ..` | inserts `Null` | `Null` becomes an object |
//!
//! ```rust
//! use json_twine::Value;
//!
//! let mut value = Value::Null;
//! value["grape"]["jelly"] = Value::from("yummy");
//!
//! // observing a missing key does not insert it
//! assert!(value["banana"].is_null());
//! assert_eq!(value.as_object().map(|o| o.len()), Some(1));
//!
//! // strict access reports it
//! assert!(value.at("banana").is_err());
//! ```

use crate::convert::{FromJson, ToJson};
use crate::{Error, Map, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

static NULL: Value = Value::Null;

/// A dynamically-typed representation of any valid JSON value.
///
/// ```rust
/// use json_twine::{Number, Value};
///
/// let null = Value::Null;
/// let num = Value::Number(Number::Float(2.75));
/// let text = Value::String("hello".to_string());
///
/// assert!(null.is_null());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

/// A JSON number.
///
/// Integral text that fits in an `i64` is kept exact as [`Number::Integer`].
/// Integral text above `i64::MAX` that fits in a `u64` is a [`Number::UInt`];
/// `UInt` never holds a value that `Integer` could. Anything with a fraction
/// or exponent, or outside both ranges, is a [`Number::Float`]. The variants
/// never compare equal to each other, so a tree keeps its exact shape through
/// a write/parse cycle.
///
/// ```rust
/// use json_twine::Number;
///
/// assert_eq!(Number::Integer(42).as_i64(), Some(42));
/// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
/// assert_eq!(Number::Float(2.5).as_f64(), 2.5);
/// assert_eq!(Number::from(u64::MAX).as_u64(), Some(u64::MAX));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    UInt(u64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_) | Number::UInt(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts this number to an `i64` if it is integral and in range.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Integer(i) => Some(i),
            Number::UInt(u) => i64::try_from(u).ok(),
            Number::Float(f) => {
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Converts this number to a `u64` if it is integral, non-negative and in
    /// range.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Number::Integer(i) => u64::try_from(i).ok(),
            Number::UInt(u) => Some(u),
            Number::Float(f) => {
                // 2^64 is exact as f64; u64::MAX as f64 rounds up to it
                if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 {
                    Some(f as u64)
                } else {
                    None
                }
            }
        }
    }

    /// Converts this number to an `f64`. Always succeeds.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(i) => i as f64,
            Number::UInt(u) => u as f64,
            Number::Float(f) => f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::UInt(u) => write!(f, "{}", u),
            Number::Float(fl) => f.write_str(&crate::ser::format_float(fl)),
        }
    }
}

macro_rules! number_from_signed {
    ($($t:ty)*) => {$(
        impl From<$t> for Number {
            fn from(value: $t) -> Self {
                Number::Integer(value as i64)
            }
        }
    )*};
}

number_from_signed!(i8 i16 i32 i64 u8 u16 u32);

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        if value <= i64::MAX as u64 {
            Number::Integer(value as i64)
        } else {
            Number::UInt(value)
        }
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::from(value as u64)
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(value as f64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns `true` for null, booleans, numbers and strings.
    #[inline]
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Returns the name of this value's variant, as used in error messages.
    ///
    /// ```rust
    /// use json_twine::Value;
    ///
    /// assert_eq!(Value::from(1.5).type_name(), "number");
    /// assert_eq!(Value::Null.type_name(), "null");
    /// ```
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// If the value is an integral number in `i64` range, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Number of children of an array or object; `0` for null and `1` for any
    /// other scalar.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Array(arr) => arr.len(),
            Value::Object(obj) => obj.len(),
            _ => 1,
        }
    }

    /// Returns `true` if [`len`](Value::len) is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observing lookup of an object key. Never inserts.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Observing lookup of an object key, returning a mutable reference.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.as_object_mut().and_then(|obj| obj.get_mut(key))
    }

    /// Strict lookup of an object key.
    ///
    /// # Errors
    ///
    /// [`Error::MissingField`] if the key is absent, [`Error::TypeMismatch`]
    /// if this value is not an object.
    ///
    /// ```rust
    /// use json_twine::Value;
    ///
    /// let value: Value = r#"{"pi": 2.75}"#.parse().unwrap();
    /// assert_eq!(value.at("pi").unwrap().as_f64(), Some(2.75));
    /// assert!(value.at("tau").unwrap_err().is_missing_field());
    /// ```
    pub fn at(&self, key: &str) -> Result<&Value> {
        match self {
            Value::Object(obj) => obj.get(key).ok_or_else(|| Error::missing_field(key)),
            other => Err(Error::type_mismatch("object", other.type_name())),
        }
    }

    /// Strict lookup of an array element.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] past the end, [`Error::TypeMismatch`] if
    /// this value is not an array.
    pub fn at_index(&self, index: usize) -> Result<&Value> {
        match self {
            Value::Array(arr) => arr.get(index).ok_or(Error::IndexOutOfBounds {
                index,
                len: arr.len(),
            }),
            other => Err(Error::type_mismatch("array", other.type_name())),
        }
    }

    /// Decodes this whole value into `T`.
    ///
    /// ```rust
    /// use json_twine::Value;
    ///
    /// let value = Value::from("USD");
    /// let currency: String = value.decode().unwrap();
    /// assert_eq!(currency, "USD");
    /// ```
    ///
    /// # Errors
    ///
    /// Whatever `T::from_json` reports.
    pub fn decode<T: FromJson>(&self) -> Result<T> {
        T::from_json(self)
    }

    /// Strictly looks up `key` and decodes it into `T`.
    ///
    /// Errors raised while decoding the child are prefixed with `key`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingField`] if the key is absent, otherwise whatever
    /// `T::from_json` reports.
    pub fn get_as<T: FromJson>(&self, key: &str) -> Result<T> {
        let child = self.at(key)?;
        T::from_json(child).map_err(|e| e.in_key(key))
    }

    /// Upserting lookup: returns the value under `key`, inserting `Null` if
    /// it is absent. A `Null` receiver becomes an empty object first.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this value is neither null nor an object.
    pub fn entry(&mut self, key: &str) -> Result<&mut Value> {
        if self.is_null() {
            *self = Value::Object(Map::new());
        }
        match self {
            Value::Object(obj) => Ok(obj.entry(key)),
            other => Err(Error::type_mismatch("object", other.type_name())),
        }
    }

    /// Inserts `value` under `key`, returning the previous value if any.
    /// A `Null` receiver becomes an empty object first.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this value is neither null nor an object.
    pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) -> Result<Option<Value>> {
        if self.is_null() {
            *self = Value::Object(Map::new());
        }
        match self {
            Value::Object(obj) => Ok(obj.insert(key.to_string(), value.into())),
            other => Err(Error::type_mismatch("object", other.type_name())),
        }
    }

    /// Appends to an array. A `Null` receiver becomes an empty array first.
    ///
    /// # Errors
    ///
    /// [`Error::TypeMismatch`] if this value is neither null nor an array.
    pub fn push<V: Into<Value>>(&mut self, value: V) -> Result<()> {
        if self.is_null() {
            *self = Value::Array(Vec::new());
        }
        match self {
            Value::Array(arr) => {
                arr.push(value.into());
                Ok(())
            }
            other => Err(Error::type_mismatch("array", other.type_name())),
        }
    }

    /// Replaces this value wholesale with the encoding of `source`.
    ///
    /// Nothing of the previous contents survives, so assigning the same
    /// source twice always yields the same tree.
    ///
    /// ```rust
    /// use json_twine::Value;
    ///
    /// let mut value: Value = r#"{"stale": true}"#.parse().unwrap();
    /// value.assign(&vec![1, 2, 3]);
    /// assert_eq!(value.dump(0), "[1,2,3]");
    /// ```
    pub fn assign<T: ToJson + ?Sized>(&mut self, source: &T) {
        *self = source.to_json();
    }

    /// Takes the value out, leaving `Null` behind.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Serializes this value. `indent == 0` writes a compact single line;
    /// otherwise each nesting level is indented by `indent` spaces.
    ///
    /// ```rust
    /// use json_twine::json;
    ///
    /// let value = json!({"apple": "gross"});
    /// assert_eq!(value.dump(0), r#"{"apple":"gross"}"#);
    /// assert_eq!(value.dump(2), "{\n  \"apple\": \"gross\"\n}");
    /// ```
    #[must_use]
    pub fn dump(&self, indent: usize) -> String {
        crate::ser::dump_value(self, &crate::DumpOptions::new().with_indent(indent))
    }
}

impl fmt::Display for Value {
    /// Compact JSON; the alternate flag (`{:#}`) pretty-prints.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = if f.alternate() {
            crate::DumpOptions::pretty()
        } else {
            crate::DumpOptions::new()
        };
        f.write_str(&crate::ser::dump_value(self, &options))
    }
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::de::parse(s)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Observing access: a missing key, or a receiver that is not an object,
    /// yields a shared `Null` without modifying anything.
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.as_array().and_then(|arr| arr.get(index)).unwrap_or(&NULL)
    }
}

impl IndexMut<&str> for Value {
    /// Upserting access. See [`Value::entry`] for the fallible form.
    ///
    /// # Panics
    ///
    /// If the receiver is neither null nor an object.
    fn index_mut(&mut self, key: &str) -> &mut Value {
        let type_name = self.type_name();
        match self.entry(key) {
            Ok(value) => value,
            Err(_) => panic!("cannot index into a JSON {} with key {:?}", type_name, key),
        }
    }
}

impl IndexMut<usize> for Value {
    /// Upserting access: a `Null` receiver becomes an array, and the array is
    /// padded with `Null` up to `index`.
    ///
    /// # Panics
    ///
    /// If the receiver is neither null nor an array.
    fn index_mut(&mut self, index: usize) -> &mut Value {
        if self.is_null() {
            *self = Value::Array(Vec::new());
        }
        match self {
            Value::Array(arr) => {
                if index >= arr.len() {
                    arr.resize(index + 1, Value::Null);
                }
                &mut arr[index]
            }
            other => panic!(
                "cannot index into a JSON {} with index {}",
                other.type_name(),
                index
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::UInt(u)) => serializer.serialize_u64(*u),
            Value::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid JSON value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number::from(value)))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Number(Number::Float(value)))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = Map::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! value_from_number {
    ($($t:ty)*) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::Number(Number::from(value))
            }
        }
    )*};
}

value_from_number!(i8 i16 i32 i64 u8 u16 u32 u64 usize f32 f64);

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
