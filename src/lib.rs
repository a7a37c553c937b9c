//! # json_twine
//!
//! A typed JSON tree with per-type encode/decode conversions, and a deferred
//! string concatenation type.
//!
//! ## JSON
//!
//! [`Value`] holds any JSON document. Text is read with [`from_str`],
//! [`from_file`] or `str::parse`, and written with [`Value::dump`],
//! [`to_string_with_options`] or [`to_file`]. Object keys keep their insertion
//! order, so a document read and written again keeps its layout.
//!
//! Types take part in the tree by implementing [`ToJson`] and [`FromJson`]:
//!
//! ```rust
//! use json_twine::{json, FromJson, Result, ToJson, Value};
//!
//! #[derive(Debug)]
//! struct Money {
//!     value: f64,
//!     currency: String,
//! }
//!
//! impl ToJson for Money {
//!     fn to_json(&self) -> Value {
//!         json!({"value": self.value, "currency": self.currency})
//!     }
//! }
//!
//! impl FromJson for Money {
//!     fn from_json(value: &Value) -> Result<Self> {
//!         Ok(Money {
//!             value: value.get_as("value")?,
//!             currency: value.get_as("currency")?,
//!         })
//!     }
//! }
//!
//! let tree: Value = r#"{"value": 9.99, "currency": "USD"}"#.parse().unwrap();
//! let money = Money::from_json(&tree).unwrap();
//! assert_eq!(money.currency, "USD");
//! assert_eq!(money.to_json().dump(0), r#"{"value":9.99,"currency":"USD"}"#);
//!
//! let err = Money::from_json(&json!({"value": 1.0})).unwrap_err();
//! assert!(err.is_missing_field());
//! ```
//!
//! serde types go through the same tree with [`to_value`] and [`from_value`].
//!
//! ### Reading vs. writing
//!
//! Indexing with `value["key"]` never modifies the tree: a missing key reads
//! as `null`. Indexing mutably, or calling [`Value::entry`], inserts the key.
//! [`Value::at`] and [`Value::get_as`] fail with [`Error::MissingField`]
//! instead of returning `null`.
//!
//! ## Twine
//!
//! [`Twine`] joins borrowed fragments without copying them and produces the
//! text once, into a `String`, a caller buffer, or a NUL-terminated buffer.
//!
//! ```rust
//! use json_twine::Twine;
//!
//! let file = "data";
//! let name = Twine::from(file) + "." + Twine::from(3i32) + ".json";
//!
//! let mut buf = Vec::new();
//! let c = name.to_null_terminated(&mut buf).unwrap();
//! assert_eq!(c.to_str().unwrap(), "data.3.json");
//! ```

pub mod convert;
pub mod de;
pub mod error;
pub mod macros;
pub mod map;
pub mod options;
pub mod ser;
pub mod twine;
pub mod value;

pub use convert::{FromJson, ToJson};
pub use de::{Parser, ValueDeserializer};
pub use error::{Error, PathSegment, Result};
pub use map::Map;
pub use options::DumpOptions;
pub use ser::{ValueSerializer, Writer};
pub use twine::{c_str, Twine};
pub use value::{Number, Value};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// Serialize any `T: Serialize` to compact JSON text.
///
/// # Examples
///
/// ```rust
/// use json_twine::to_string;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: f64, y: f64 }
///
/// let point = Point { x: 1.0, y: 2.0 };
/// assert_eq!(to_string(&point).unwrap(), r#"{"x":1.0,"y":2.0}"#);
/// ```
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` impl fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, DumpOptions::default())
}

/// Serialize any `T: Serialize` to indented JSON text, four spaces per level.
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` impl fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, DumpOptions::pretty())
}

/// Serialize any `T: Serialize` to JSON text with custom options.
///
/// ```rust
/// use json_twine::{json, to_string_with_options, DumpOptions};
///
/// let value = json!({"a": [1, 2]});
/// let text = to_string_with_options(&value, DumpOptions::new().with_indent(2)).unwrap();
/// assert_eq!(text, "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
/// ```
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` impl fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: DumpOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let tree = to_value(value)?;
    Ok(ser::dump_value(&tree, &options))
}

/// Convert any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use json_twine::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value: Value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_object());
/// assert_eq!(value["y"].as_i64(), Some(2));
/// ```
///
/// # Errors
///
/// Returns an error if `T`'s `Serialize` impl fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Decode a `T: Deserialize` from a [`Value`].
///
/// # Errors
///
/// Returns [`Error::MissingField`] or [`Error::TypeMismatch`] when the tree
/// does not have the shape `T` expects.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

/// Serialize any `T: Serialize` as compact JSON to a writer.
///
/// # Errors
///
/// Returns [`Error::Io`] if writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, DumpOptions::default())
}

/// Serialize any `T: Serialize` to a writer with custom options.
///
/// # Errors
///
/// Returns [`Error::Io`] if writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(mut writer: W, value: &T, options: DumpOptions) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io("", &e.to_string()))?;
    Ok(())
}

/// Parse JSON text and decode it as `T`.
///
/// # Examples
///
/// ```rust
/// use json_twine::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: f64, y: f64 }
///
/// let point: Point = from_str(r#"{"x": 1.0, "y": 2.0}"#).unwrap();
/// assert_eq!(point, Point { x: 1.0, y: 2.0 });
/// ```
///
/// # Errors
///
/// Returns a syntax error with line and column for malformed text, or a
/// decode error if the document does not have the shape `T` expects.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_value(de::parse(s)?)
}

/// Parse JSON bytes and decode them as `T`.
///
/// # Errors
///
/// Returns an error if the bytes are not UTF-8, not valid JSON, or do not
/// decode as `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

/// Read a JSON document from a stream and decode it as `T`.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, otherwise as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io("", &e.to_string()))?;
    from_str(&string)
}

/// Read and parse a JSON file.
///
/// The file is opened before anything is parsed, so a missing or unreadable
/// file is reported as [`Error::Io`] carrying the path.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, a syntax error if its content is
/// not valid JSON.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| Error::io(&path.display().to_string(), &e.to_string()))?;
    debug!("read {} bytes from {}", text.len(), path.display());
    de::parse(&text)
}

/// Write a [`Value`] to a file, replacing any existing content.
///
/// ```rust
/// use json_twine::{from_file, json, to_file, DumpOptions};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("points.json");
///
/// let points = json!([{"x": 1.0, "y": 2.0}]);
/// to_file(&path, &points, DumpOptions::new().with_indent(2)).unwrap();
/// assert_eq!(from_file(&path).unwrap(), points);
/// ```
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be created or written.
pub fn to_file<P: AsRef<Path>>(path: P, value: &Value, options: DumpOptions) -> Result<()> {
    let path = path.as_ref();
    let mut text = ser::dump_value(value, &options);
    if options.is_pretty() {
        text.push('\n');
    }
    fs::write(path, text.as_bytes())
        .map_err(|e| Error::io(&path.display().to_string(), &e.to_string()))?;
    debug!("wrote {} bytes to {}", text.len(), path.display());
    Ok(())
}
