//! JSON serialization.
//!
//! Two pieces live here:
//!
//! - [`Writer`] turns a [`Value`] tree into JSON text, compact or indented
//!   according to [`DumpOptions`].
//! - [`ValueSerializer`] is a serde `Serializer` that turns any
//!   `T: Serialize` into a [`Value`] tree.
//!
//! The crate-root helpers wrap both:
//!
//! ```rust
//! use json_twine::{to_string, to_string_pretty};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: f64, y: f64 }
//!
//! let point = Point { x: 1.0, y: 2.0 };
//! assert_eq!(to_string(&point).unwrap(), r#"{"x":1.0,"y":2.0}"#);
//! assert_eq!(
//!     to_string_pretty(&point).unwrap(),
//!     "{\n    \"x\": 1.0,\n    \"y\": 2.0\n}"
//! );
//! ```

use crate::{DumpOptions, Error, Map, Number, Result, Value};
use crate::options::MAX_INDENT;
use log::{trace, warn};
use serde::{ser, Serialize};

/// Writes a [`Value`] tree as JSON text.
///
/// ```rust
/// use json_twine::{json, DumpOptions, Writer};
///
/// let mut writer = Writer::new(DumpOptions::new());
/// writer.write_value(&json!([1, 2, 3]));
/// assert_eq!(writer.into_inner(), "[1,2,3]");
/// ```
pub struct Writer {
    output: String,
    options: DumpOptions,
    indent_level: usize,
}

impl Writer {
    pub fn new(mut options: DumpOptions) -> Self {
        options.indent = options.indent.min(MAX_INDENT);
        Writer {
            output: String::with_capacity(256),
            options,
            indent_level: 0,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    fn write_newline(&mut self) {
        if self.options.is_pretty() {
            self.output.push('\n');
            let width = self.indent_level.saturating_mul(self.options.indent);
            self.output.extend(std::iter::repeat(' ').take(width));
        }
    }

    pub fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.output.push_str("null"),
            Value::Bool(b) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Number(Number::Integer(i)) => self.output.push_str(&i.to_string()),
            Value::Number(Number::UInt(u)) => self.output.push_str(&u.to_string()),
            Value::Number(Number::Float(f)) => {
                if !f.is_finite() {
                    warn!("non-finite number {} written as null", f);
                }
                self.output.push_str(&format_float(*f));
            }
            Value::String(s) => self.write_string(s),
            Value::Array(arr) => self.write_array(arr),
            Value::Object(obj) => self.write_object(obj),
        }
    }

    fn write_array(&mut self, arr: &[Value]) {
        if arr.is_empty() {
            self.output.push_str("[]");
            return;
        }

        self.output.push('[');
        self.indent_level += 1;
        for (i, element) in arr.iter().enumerate() {
            if i > 0 {
                self.output.push(',');
            }
            self.write_newline();
            self.write_value(element);
        }
        self.indent_level -= 1;
        self.write_newline();
        self.output.push(']');
    }

    fn write_object(&mut self, obj: &Map) {
        if obj.is_empty() {
            self.output.push_str("{}");
            return;
        }

        self.output.push('{');
        self.indent_level += 1;
        for (i, (key, value)) in obj.iter().enumerate() {
            if i > 0 {
                self.output.push(',');
            }
            self.write_newline();
            self.write_string(key);
            self.output.push(':');
            if self.options.is_pretty() {
                self.output.push(' ');
            }
            self.write_value(value);
        }
        self.indent_level -= 1;
        self.write_newline();
        self.output.push('}');
    }

    fn write_string(&mut self, s: &str) {
        self.output.reserve(s.len() + 2);
        self.output.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.output.push_str("\\\""),
                '\\' => self.output.push_str("\\\\"),
                '\n' => self.output.push_str("\\n"),
                '\r' => self.output.push_str("\\r"),
                '\t' => self.output.push_str("\\t"),
                '\u{0008}' => self.output.push_str("\\b"),
                '\u{000C}' => self.output.push_str("\\f"),
                c if (c as u32) < 0x20 => self.push_unicode_escape(c as u16),
                c if self.options.ensure_ascii && !c.is_ascii() => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        self.push_unicode_escape(*unit);
                    }
                }
                c => self.output.push(c),
            }
        }
        self.output.push('"');
    }

    fn push_unicode_escape(&mut self, unit: u16) {
        self.output.push_str(&format!("\\u{:04x}", unit));
    }
}

/// Formats a float so that it reads back as a float.
///
/// Finite values use the shortest representation that round-trips, always
/// carrying a `.` or an exponent. JSON has no spelling for infinities or NaN;
/// they are written as `null`.
///
/// ```rust
/// use json_twine::ser::format_float;
///
/// assert_eq!(format_float(1.0), "1.0");
/// assert_eq!(format_float(9.99), "9.99");
/// assert_eq!(format_float(1e100), "1e100");
/// assert_eq!(format_float(f64::NAN), "null");
/// ```
#[must_use]
pub fn format_float(f: f64) -> String {
    if f.is_finite() {
        format!("{:?}", f)
    } else {
        "null".to_string()
    }
}

pub(crate) fn dump_value(value: &Value, options: &DumpOptions) -> String {
    let mut writer = Writer::new(options.clone());
    writer.write_value(value);
    let text = writer.into_inner();
    trace!(
        "wrote {} bytes of {} JSON (indent {})",
        text.len(),
        value.type_name(),
        options.indent
    );
    text
}

/// A serde `Serializer` producing a [`Value`] tree.
///
/// Enum variants carrying data use the externally tagged layout:
/// `{"Variant": payload}`.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeTupleVariant {
    name: String,
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: Map,
    current_key: Option<String>,
}

pub struct SerializeStructVariant {
    name: String,
    map: Map,
}

fn tagged(variant: &str, payload: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(variant.to_string(), payload);
    Value::Object(map)
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Array(v.iter().map(|&b| Value::from(b)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_json_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            name: variant.to_string(),
            vec: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap {
            map: Map::with_capacity(len.unwrap_or(0)),
            current_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            name: variant.to_string(),
            map: Map::with_capacity(len),
        })
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_json_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.vec.push(to_json_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(tagged(&self.name, Value::Array(self.vec)))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match to_json_value(key)? {
            Value::String(s) => self.current_key = Some(s),
            Value::Number(n) => self.current_key = Some(n.to_string()),
            Value::Bool(b) => self.current_key = Some(b.to_string()),
            other => {
                return Err(Error::type_mismatch("string key", other.type_name()));
            }
        }
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_json_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_json_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_json_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(tagged(&self.name, Value::Object(self.map)))
    }
}

fn to_json_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json;

    fn compact(value: &Value) -> String {
        dump_value(value, &DumpOptions::new())
    }

    #[test]
    fn test_compact_nested() {
        let value = json!({
            "apple": "gross",
            "grape": {"jelly": "yummy"},
            "list": [1, 2.5, null, true]
        });
        assert_eq!(
            compact(&value),
            r#"{"apple":"gross","grape":{"jelly":"yummy"},"list":[1,2.5,null,true]}"#
        );
    }

    #[test]
    fn test_pretty_indent_width() {
        let value = json!({"a": [1, {}], "b": []});
        let text = dump_value(&value, &DumpOptions::new().with_indent(2));
        assert_eq!(text, "{\n  \"a\": [\n    1,\n    {}\n  ],\n  \"b\": []\n}");
    }

    #[test]
    fn test_oversized_indent_is_clamped() {
        let value = json!({"a": {"b": 1}});
        let options = DumpOptions {
            indent: usize::MAX,
            ensure_ascii: false,
        };
        let text = dump_value(&value, &options);
        let inner = format!("\n{}\"b\": 1", " ".repeat(2 * MAX_INDENT));
        assert!(text.contains(&inner), "{:?}", text);
        assert_eq!(text.parse::<Value>().unwrap(), value);
    }

    #[test]
    fn test_string_escapes() {
        let value = Value::from("quote\" slash\\ nl\n tab\t bell\u{7}");
        assert_eq!(
            compact(&value),
            r#""quote\" slash\\ nl\n tab\t bell\u0007""#
        );
    }

    #[test]
    fn test_ensure_ascii_uses_surrogate_pairs() {
        let value = Value::from("é😀");
        let text = dump_value(&value, &DumpOptions::new().with_ensure_ascii(true));
        assert_eq!(text, r#""\u00e9\ud83d\ude00""#);
    }

    #[test]
    fn test_non_finite_written_as_null() {
        assert_eq!(compact(&Value::from(f64::INFINITY)), "null");
        assert_eq!(compact(&Value::from(f64::NAN)), "null");
    }

    #[test]
    fn test_float_keeps_fraction_marker() {
        assert_eq!(compact(&Value::from(1.0)), "1.0");
        assert_eq!(compact(&Value::from(-0.5)), "-0.5");
        assert_eq!(compact(&Value::from(34)), "34");
    }

    #[derive(Serialize)]
    enum Shape {
        Unit,
        Circle(f64),
        Segment(i32, i32),
        Rect { w: u32, h: u32 },
    }

    #[test]
    fn test_value_serializer_enum_layout() {
        let shapes = vec![
            Shape::Unit,
            Shape::Circle(1.5),
            Shape::Segment(1, 2),
            Shape::Rect { w: 3, h: 4 },
        ];
        let value = to_json_value(&shapes).unwrap();
        assert_eq!(
            compact(&value),
            r#"["Unit",{"Circle":1.5},{"Segment":[1,2]},{"Rect":{"w":3,"h":4}}]"#
        );
    }

    #[test]
    fn test_value_serializer_numeric_map_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(1, "one");
        map.insert(2, "two");
        let value = to_json_value(&map).unwrap();
        assert_eq!(compact(&value), r#"{"1":"one","2":"two"}"#);
    }
}
