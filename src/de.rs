//! JSON deserialization.
//!
//! This module provides two pieces:
//!
//! - [`Parser`], a single-pass recursive-descent reader turning JSON text into
//!   a [`Value`] tree. Errors carry 1-based line and column numbers.
//! - [`ValueDeserializer`], a serde `Deserializer` reading from a [`Value`],
//!   used by [`from_value`](crate::from_value) and [`from_str`](crate::from_str).
//!
//! ```rust
//! use json_twine::Value;
//!
//! let value: Value = r#"{"currency": "USD", "value": 9.99}"#.parse().unwrap();
//! assert_eq!(value["currency"].as_str(), Some("USD"));
//!
//! let err = "[1, 2,]".parse::<Value>().unwrap_err();
//! assert!(err.is_syntax());
//! ```

use crate::{Error, Map, Number, Result, Value};
use log::trace;
use serde::{de, forward_to_deserialize_any};

/// Deepest array/object nesting the parser accepts.
pub const MAX_DEPTH: usize = 128;

/// Parses a complete JSON document into a [`Value`].
///
/// # Errors
///
/// [`Error::Syntax`] or [`Error::UnexpectedEof`] if `input` is not exactly one
/// well-formed JSON value surrounded by optional whitespace.
pub fn parse(input: &str) -> Result<Value> {
    trace!("parsing {} bytes of JSON", input.len());
    let mut parser = Parser::new(input);
    let value = parser.parse_value()?;
    parser.finish()?;
    Ok(value)
}

/// The JSON text parser.
pub struct Parser<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        // a leading byte order mark is not part of the document
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Parser {
            input,
            position: 0,
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r') {
                self.next_char();
            } else {
                break;
            }
        }
    }

    fn syntax(&self, msg: &str) -> Error {
        Error::syntax(self.line, self.column, msg)
    }

    fn eof(&self, expected: &str) -> Error {
        Error::unexpected_eof(self.line, self.column, expected)
    }

    fn expect_char(&mut self, expected: char, what: &str) -> Result<()> {
        match self.peek_char() {
            Some(ch) if ch == expected => {
                self.next_char();
                Ok(())
            }
            Some(ch) => Err(self.syntax(&format!("expected {}, found '{}'", what, ch))),
            None => Err(self.eof(what)),
        }
    }

    /// Requires that only whitespace remains.
    pub fn finish(&mut self) -> Result<()> {
        self.skip_whitespace();
        match self.peek_char() {
            None => Ok(()),
            Some(ch) => Err(self.syntax(&format!(
                "trailing characters after JSON value, found '{}'",
                ch
            ))),
        }
    }

    /// Parses one value, skipping leading whitespace.
    pub fn parse_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.peek_char() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => self.parse_string().map(Value::String),
            Some('t') => self.parse_literal("true", Value::Bool(true)),
            Some('f') => self.parse_literal("false", Value::Bool(false)),
            Some('n') => self.parse_literal("null", Value::Null),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.parse_number().map(Value::Number),
            Some(ch) => Err(self.syntax(&format!("expected value, found '{}'", ch))),
            None => Err(self.eof("value")),
        }
    }

    fn parse_literal(&mut self, word: &str, value: Value) -> Result<Value> {
        if self.input[self.position..].starts_with(word) {
            for _ in 0..word.len() {
                self.next_char();
            }
            Ok(value)
        } else {
            Err(self.syntax(&format!("invalid literal, expected '{}'", word)))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.syntax(&format!("nesting deeper than {} levels", MAX_DEPTH)));
        }
        Ok(())
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect_char('[', "'['")?;
        self.enter()?;
        let mut elements = Vec::new();

        self.skip_whitespace();
        if self.peek_char() == Some(']') {
            self.next_char();
            self.depth -= 1;
            return Ok(Value::Array(elements));
        }

        loop {
            elements.push(self.parse_value()?);
            self.skip_whitespace();
            match self.next_char() {
                Some(',') => continue,
                Some(']') => break,
                Some(ch) => {
                    return Err(self.syntax(&format!("expected ',' or ']', found '{}'", ch)))
                }
                None => return Err(self.eof("',' or ']'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(elements))
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.expect_char('{', "'{'")?;
        self.enter()?;
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek_char() == Some('}') {
            self.next_char();
            self.depth -= 1;
            return Ok(Value::Object(map));
        }

        loop {
            self.skip_whitespace();
            let key = match self.peek_char() {
                Some('"') => self.parse_string()?,
                Some(ch) => {
                    return Err(self.syntax(&format!("expected string key, found '{}'", ch)))
                }
                None => return Err(self.eof("string key")),
            };
            self.skip_whitespace();
            self.expect_char(':', "':'")?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.next_char() {
                Some(',') => continue,
                Some('}') => break,
                Some(ch) => {
                    return Err(self.syntax(&format!("expected ',' or '}}', found '{}'", ch)))
                }
                None => return Err(self.eof("',' or '}'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn parse_hex4(&mut self) -> Result<u16> {
        let mut code: u16 = 0;
        for _ in 0..4 {
            let digit = match self.next_char() {
                Some(ch) => ch.to_digit(16).ok_or_else(|| {
                    self.syntax("invalid unicode escape (expected 4 hex digits)")
                })?,
                None => return Err(self.eof("hex digit")),
            };
            code = code * 16 + digit as u16;
        }
        Ok(code)
    }

    fn parse_unicode_escape(&mut self) -> Result<char> {
        let first = self.parse_hex4()?;
        let code_point = match first {
            0xD800..=0xDBFF => {
                if !self.input[self.position..].starts_with("\\u") {
                    return Err(self.syntax("unpaired high surrogate in unicode escape"));
                }
                self.next_char();
                self.next_char();
                let second = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.syntax("invalid low surrogate in unicode escape"));
                }
                0x10000 + (((first as u32) - 0xD800) << 10) + ((second as u32) - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(self.syntax("unpaired low surrogate in unicode escape"));
            }
            other => other as u32,
        };
        char::from_u32(code_point).ok_or_else(|| self.syntax("invalid unicode code point"))
    }

    fn parse_string(&mut self) -> Result<String> {
        self.expect_char('"', "'\"'")?;
        let mut result = String::new();

        loop {
            // copy the run up to the next quote, backslash or control character
            let rest = &self.input[self.position..];
            let run = rest
                .find(|c: char| c == '"' || c == '\\' || (c as u32) < 0x20)
                .unwrap_or(rest.len());
            result.push_str(&rest[..run]);
            self.position += run;
            self.column += rest[..run].chars().count();

            match self.next_char() {
                Some('"') => return Ok(result),
                Some('\\') => match self.next_char() {
                    Some('"') => result.push('"'),
                    Some('\\') => result.push('\\'),
                    Some('/') => result.push('/'),
                    Some('b') => result.push('\u{0008}'),
                    Some('f') => result.push('\u{000C}'),
                    Some('n') => result.push('\n'),
                    Some('r') => result.push('\r'),
                    Some('t') => result.push('\t'),
                    Some('u') => result.push(self.parse_unicode_escape()?),
                    Some(other) => {
                        return Err(self.syntax(&format!("invalid escape '\\{}'", other)))
                    }
                    None => return Err(self.eof("escape sequence")),
                },
                Some(_) => return Err(self.syntax("control character in string")),
                None => return Err(self.eof("closing '\"'")),
            }
        }
    }

    fn consume_digits(&mut self) -> usize {
        let mut count = 0;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                self.next_char();
                count += 1;
            } else {
                break;
            }
        }
        count
    }

    fn parse_number(&mut self) -> Result<Number> {
        let start = self.position;
        let mut is_float = false;

        if self.peek_char() == Some('-') {
            self.next_char();
        }

        match self.peek_char() {
            Some('0') => {
                self.next_char();
                if self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                    return Err(self.syntax("leading zeros are not allowed"));
                }
            }
            Some(ch) if ch.is_ascii_digit() => {
                self.consume_digits();
            }
            Some(_) => return Err(self.syntax("expected digit after '-'")),
            None => return Err(self.eof("digit")),
        }

        if self.peek_char() == Some('.') {
            is_float = true;
            self.next_char();
            if self.consume_digits() == 0 {
                return Err(self.syntax("expected digit after decimal point"));
            }
        }

        if matches!(self.peek_char(), Some('e') | Some('E')) {
            is_float = true;
            self.next_char();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.next_char();
            }
            if self.consume_digits() == 0 {
                return Err(self.syntax("expected digit in exponent"));
            }
        }

        let text = &self.input[start..self.position];
        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Number::Integer(i));
            }
            if let Ok(u) = text.parse::<u64>() {
                return Ok(Number::UInt(u));
            }
        }
        // outside both integer ranges, or has a fraction or exponent
        let f = text
            .parse::<f64>()
            .map_err(|_| self.syntax("invalid number"))?;
        if !f.is_finite() {
            return Err(self.syntax("number out of range"));
        }
        Ok(Number::Float(f))
    }
}

/// A serde `Deserializer` that reads from an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Value::Number(Number::UInt(u)) => visitor.visit_u64(u),
            Value::Number(Number::Float(f)) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(ValueDeserializer::new(other)),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer::new(variant, None)),
            Value::Object(obj) if obj.len() == 1 => {
                let mut entries = obj.into_iter();
                match entries.next() {
                    Some((variant, value)) => {
                        visitor.visit_enum(EnumDeserializer::new(variant, Some(value)))
                    }
                    None => Err(Error::custom("expected enum variant")),
                }
            }
            other => Err(Error::type_mismatch(
                "string or single-key object",
                other.type_name(),
            )),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl EnumDeserializer {
    fn new(variant: String, value: Option<Value>) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Null) | None => Ok(()),
            Some(other) => Err(Error::type_mismatch("unit variant", other.type_name())),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::type_mismatch("newtype variant", "unit variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(arr)) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Some(other) => Err(Error::type_mismatch("tuple variant", other.type_name())),
            None => Err(Error::type_mismatch("tuple variant", "unit variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Object(obj)) => visitor.visit_map(MapDeserializer::new(obj)),
            Some(other) => Err(Error::type_mismatch("struct variant", other.type_name())),
            None => Err(Error::type_mismatch("struct variant", "unit variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse("null").unwrap(), Value::Null);
        assert_eq!(parse(" true ").unwrap(), Value::Bool(true));
        assert_eq!(parse("-12").unwrap(), Value::from(-12));
        assert_eq!(parse("9.99").unwrap(), Value::from(9.99));
        assert_eq!(parse("1e3").unwrap(), Value::from(1000.0));
        assert_eq!(parse("-0").unwrap(), Value::from(0));
        assert_eq!(parse(r#""hi""#).unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_integer_ranges() {
        assert_eq!(
            parse("9223372036854775807").unwrap(),
            Value::Number(Number::Integer(i64::MAX))
        );
        assert_eq!(
            parse("9223372036854775808").unwrap(),
            Value::Number(Number::UInt(i64::MAX as u64 + 1))
        );
        assert_eq!(
            parse("18446744073709551615").unwrap(),
            Value::Number(Number::UInt(u64::MAX))
        );
        let value = parse("18446744073709551616").unwrap();
        assert!(matches!(value, Value::Number(Number::Float(_))));
        let value = parse("-9223372036854775809").unwrap();
        assert!(matches!(value, Value::Number(Number::Float(_))));
    }

    #[test]
    fn test_overflowing_float_rejected() {
        for text in ["1e400", "-1e400", "[1, 2e999]"] {
            let err = parse(text).unwrap_err();
            assert!(err.is_syntax(), "{}: {:?}", text, err);
            assert!(err.to_string().contains("number out of range"), "{}", err);
        }
        assert_eq!(parse("1e-400").unwrap(), Value::from(0.0));
    }

    #[test]
    fn test_parse_nested() {
        let value = parse(r#"{"object": {"currency": "USD"}, "list": [1, [2, {}]]}"#).unwrap();
        assert_eq!(value["object"]["currency"].as_str(), Some("USD"));
        assert_eq!(value["list"][1][0].as_i64(), Some(2));
        assert!(value["list"][1][1].is_object());
    }

    #[test]
    fn test_key_order_preserved() {
        let value = parse(r#"{"b": 1, "a": 2, "c": 3}"#).unwrap();
        let keys: Vec<_> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_string_escapes() {
        let value = parse(r#""a\"b\\c\/d\n\u00e9\ud83d\ude00""#).unwrap();
        assert_eq!(value.as_str(), Some("a\"b\\c/d\né😀"));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "", "{", "[1,]", "[1 2]", "{\"a\" 1}", "{a: 1}", "01", "1.", "-", "1e",
            "tru", "\"open", "\"bad \\x\"", "\"\\ud800\"", "\"\\udc00\"", "[1] x",
            "\"tab\there\"",
        ] {
            let err = parse(bad).unwrap_err();
            assert!(err.is_syntax(), "{:?} gave {:?}", bad, err);
        }
    }

    #[test]
    fn test_error_position() {
        let err = parse("{\n  \"a\": 1,\n  \"b\" 2\n}").unwrap_err();
        match err {
            Error::Syntax { line, col, .. } => {
                assert_eq!(line, 3);
                assert_eq!(col, 7);
            }
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_eof_error() {
        let err = parse("[1, 2").unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert!(parse(&deep).unwrap_err().is_syntax());

        let ok = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn test_byte_order_mark_skipped() {
        assert_eq!(parse("\u{feff}[]").unwrap(), Value::Array(vec![]));
    }
}
