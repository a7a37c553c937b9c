//! Typed conversions between Rust values and [`Value`] trees.
//!
//! A type opts in by implementing [`ToJson`] (encode, total) and/or
//! [`FromJson`] (decode, fallible). The conversion is chosen by the static
//! type of the value, so a type can be encodable without being decodable.
//!
//! Decoding is strict: look fields up with [`Value::get_as`], which fails on a
//! missing key instead of substituting a default. Extra keys are ignored.
//!
//! ```rust
//! use json_twine::{json, FromJson, Result, ToJson, Value};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl ToJson for Point {
//!     fn to_json(&self) -> Value {
//!         json!({"x": self.x, "y": self.y})
//!     }
//! }
//!
//! impl FromJson for Point {
//!     fn from_json(value: &Value) -> Result<Self> {
//!         Ok(Point {
//!             x: value.get_as("x")?,
//!             y: value.get_as("y")?,
//!         })
//!     }
//! }
//!
//! let points = vec![Point { x: 1.0, y: 2.0 }, Point { x: 3.0, y: 34.0 }];
//! let tree = points.to_json();
//! assert_eq!(tree.dump(0), r#"[{"x":1.0,"y":2.0},{"x":3.0,"y":34.0}]"#);
//!
//! let back: Vec<Point> = tree.decode().unwrap();
//! assert_eq!(back, points);
//! ```

use crate::{Error, Map, Result, Value};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Encodes a value as a fresh [`Value`] tree.
pub trait ToJson {
    fn to_json(&self) -> Value;
}

/// Decodes a value from a [`Value`] tree.
pub trait FromJson: Sized {
    /// # Errors
    ///
    /// Implementations report [`Error::MissingField`] for absent keys and
    /// [`Error::TypeMismatch`] for values of the wrong variant.
    fn from_json(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &str, found: &Value) -> Error {
    Error::type_mismatch(expected, found.type_name())
}

impl ToJson for Value {
    fn to_json(&self) -> Value {
        self.clone()
    }
}

impl FromJson for Value {
    fn from_json(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl ToJson for bool {
    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromJson for bool {
    fn from_json(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("boolean", value))
    }
}

macro_rules! integer_conversions {
    ($($t:ty)*) => {$(
        impl ToJson for $t {
            fn to_json(&self) -> Value {
                Value::from(*self)
            }
        }

        impl FromJson for $t {
            fn from_json(value: &Value) -> Result<Self> {
                let converted = match (value.as_i64(), value.as_u64()) {
                    (Some(i), _) => <$t>::try_from(i).ok(),
                    (None, Some(u)) => <$t>::try_from(u).ok(),
                    (None, None) => return Err(mismatch("integer", value)),
                };
                converted.ok_or_else(|| {
                    Error::type_mismatch(stringify!($t), &format!("out-of-range number {}", value))
                })
            }
        }
    )*};
}

integer_conversions!(i8 i16 i32 i64 u8 u16 u32 u64 usize);

impl ToJson for f64 {
    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl FromJson for f64 {
    fn from_json(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("number", value))
    }
}

impl ToJson for f32 {
    fn to_json(&self) -> Value {
        Value::from(*self)
    }
}

impl FromJson for f32 {
    fn from_json(value: &Value) -> Result<Self> {
        f64::from_json(value).map(|f| f as f32)
    }
}

impl ToJson for str {
    fn to_json(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToJson for String {
    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromJson for String {
    fn from_json(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl ToJson for char {
    fn to_json(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: ToJson + ?Sized> ToJson for &T {
    fn to_json(&self) -> Value {
        (**self).to_json()
    }
}

impl<T: ToJson + ?Sized> ToJson for Box<T> {
    fn to_json(&self) -> Value {
        (**self).to_json()
    }
}

impl<T: FromJson> FromJson for Box<T> {
    fn from_json(value: &Value) -> Result<Self> {
        T::from_json(value).map(Box::new)
    }
}

impl<T: ToJson> ToJson for Option<T> {
    fn to_json(&self) -> Value {
        match self {
            Some(inner) => inner.to_json(),
            None => Value::Null,
        }
    }
}

/// `null` decodes to `None`; anything else must decode as `T`.
impl<T: FromJson> FromJson for Option<T> {
    fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_json(other).map(Some),
        }
    }
}

impl<T: ToJson> ToJson for [T] {
    fn to_json(&self) -> Value {
        Value::Array(self.iter().map(ToJson::to_json).collect())
    }
}

impl<T: ToJson, const N: usize> ToJson for [T; N] {
    fn to_json(&self) -> Value {
        self.as_slice().to_json()
    }
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self) -> Value {
        self.as_slice().to_json()
    }
}

/// Decodes element-wise. The first failing element aborts the whole
/// sequence; its error is prefixed with the element index.
impl<T: FromJson> FromJson for Vec<T> {
    fn from_json(value: &Value) -> Result<Self> {
        let arr = value.as_array().ok_or_else(|| mismatch("array", value))?;
        arr.iter()
            .enumerate()
            .map(|(i, element)| T::from_json(element).map_err(|e| e.in_index(i)))
            .collect()
    }
}

impl<A: ToJson, B: ToJson> ToJson for (A, B) {
    fn to_json(&self) -> Value {
        Value::Array(vec![self.0.to_json(), self.1.to_json()])
    }
}

impl<A: FromJson, B: FromJson> FromJson for (A, B) {
    fn from_json(value: &Value) -> Result<Self> {
        let arr = value.as_array().ok_or_else(|| mismatch("array", value))?;
        match arr.as_slice() {
            [a, b] => Ok((
                A::from_json(a).map_err(|e| e.in_index(0))?,
                B::from_json(b).map_err(|e| e.in_index(1))?,
            )),
            _ => Err(Error::type_mismatch(
                "array of length 2",
                &format!("array of length {}", arr.len()),
            )),
        }
    }
}

impl ToJson for Map {
    fn to_json(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl FromJson for Map {
    fn from_json(value: &Value) -> Result<Self> {
        value
            .as_object()
            .cloned()
            .ok_or_else(|| mismatch("object", value))
    }
}

impl<T: ToJson> ToJson for BTreeMap<String, T> {
    fn to_json(&self) -> Value {
        Value::Object(self.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

impl<T: FromJson> FromJson for BTreeMap<String, T> {
    fn from_json(value: &Value) -> Result<Self> {
        decode_entries(value)
    }
}

impl<T: ToJson, S> ToJson for HashMap<String, T, S> {
    fn to_json(&self) -> Value {
        Value::Object(self.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
    }
}

impl<T: FromJson, S: BuildHasher + Default> FromJson for HashMap<String, T, S> {
    fn from_json(value: &Value) -> Result<Self> {
        decode_entries(value)
    }
}

fn decode_entries<T, C>(value: &Value) -> Result<C>
where
    T: FromJson,
    C: FromIterator<(String, T)>,
{
    let obj = value.as_object().ok_or_else(|| mismatch("object", value))?;
    obj.iter()
        .map(|(k, v)| T::from_json(v).map(|t| (k.clone(), t)).map_err(|e| e.in_key(k)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathSegment;
    use crate::json;

    #[test]
    fn test_scalar_decode_mismatch() {
        assert_eq!(
            f64::from_json(&Value::from("1.0")),
            Err(Error::type_mismatch("number", "string"))
        );
        assert!(bool::from_json(&Value::from(1)).is_err());
        assert!(String::from_json(&Value::Null).is_err());
    }

    #[test]
    fn test_integer_range_checked() {
        assert_eq!(u8::from_json(&Value::from(255)), Ok(255));
        assert!(u8::from_json(&Value::from(256)).is_err());
        assert!(u32::from_json(&Value::from(-1)).is_err());
        assert_eq!(i32::from_json(&Value::from(7.0)), Ok(7));
        assert!(i32::from_json(&Value::from(7.5)).is_err());
    }

    #[test]
    fn test_u64_above_i64_range_round_trips() {
        for n in [u64::MAX, i64::MAX as u64 + 1, i64::MAX as u64, 0] {
            let tree = n.to_json();
            assert_eq!(u64::from_json(&tree), Ok(n));
            let back: Value = tree.dump(0).parse().unwrap();
            assert_eq!(back, tree);
            assert_eq!(u64::from_json(&back), Ok(n));
        }
        assert_eq!(usize::from_json(&(usize::MAX).to_json()), Ok(usize::MAX));
        assert!(i64::from_json(&u64::MAX.to_json()).is_err());
        assert!(u64::from_json(&Value::from(-1)).is_err());
        assert_eq!(u64::from_json(&Value::from(4096.0)), Ok(4096));
    }

    #[test]
    fn test_float_accepts_integer_text() {
        assert_eq!(f64::from_json(&Value::from(2)), Ok(2.0));
    }

    #[test]
    fn test_vec_decode_is_atomic() {
        let tree = json!([1, 2, "three", 4]);
        let err = Vec::<i64>::from_json(&tree).unwrap_err();
        match err {
            Error::Path { path, source } => {
                assert_eq!(path, vec![PathSegment::Index(2)]);
                assert!(matches!(*source, Error::TypeMismatch { .. }));
            }
            other => panic!("Expected path error, got {:?}", other),
        }
    }

    #[test]
    fn test_option_round_trip() {
        let some: Option<String> = Some("x".to_string());
        assert_eq!(Option::<String>::from_json(&some.to_json()), Ok(some));
        assert_eq!(None::<i32>.to_json(), Value::Null);
        assert_eq!(Option::<i32>::from_json(&Value::Null), Ok(None));
    }

    #[test]
    fn test_tuple_length_checked() {
        let pair = (1, "one".to_string());
        assert_eq!(<(i32, String)>::from_json(&pair.to_json()), Ok(pair));
        assert!(<(i32, i32)>::from_json(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_maps() {
        let mut scores = BTreeMap::new();
        scores.insert("alice".to_string(), 3);
        scores.insert("bob".to_string(), 5);
        let tree = scores.to_json();
        assert_eq!(tree.dump(0), r#"{"alice":3,"bob":5}"#);

        let back: HashMap<String, i32> = tree.decode().unwrap();
        assert_eq!(back.get("bob"), Some(&5));

        let err = BTreeMap::<String, i32>::from_json(&json!({"a": 1, "b": "x"})).unwrap_err();
        assert_eq!(err.to_string(), "b: type mismatch: expected integer, found string");
    }

    #[test]
    fn test_slices_and_arrays() {
        assert_eq!([1, 2, 3].to_json().dump(0), "[1,2,3]");
        let words: &[&str] = &["a", "b"];
        assert_eq!(words.to_json().dump(0), r#"["a","b"]"#);
    }
}
