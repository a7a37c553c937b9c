//! Error types for JSON parsing, typed decoding, and twine buffering.
//!
//! All fallible operations in this crate return [`Result`], whose error type is
//! the single [`Error`] enum. The variants fall into two families:
//!
//! - **Boundary errors**: [`Error::Io`] is raised when a file or stream cannot
//!   be opened, read, or written. Callers are expected to check for it before
//!   doing anything with the data.
//! - **Decode errors**: [`Error::Syntax`] and [`Error::UnexpectedEof`] come from
//!   malformed text, while [`Error::MissingField`], [`Error::TypeMismatch`] and
//!   [`Error::IndexOutOfBounds`] come from strict access into a [`Value`](crate::Value).
//!   A failing field aborts the decode of the whole enclosing value.
//!
//! ## Examples
//!
//! ```rust
//! use json_twine::{Error, Value};
//!
//! let value: Value = r#"{"value": 9.99}"#.parse().unwrap();
//! let err = value.at("currency").unwrap_err();
//! assert!(matches!(err, Error::MissingField { .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A file or stream could not be opened, read, or written.
    #[error("IO error{}: {msg}", path_suffix(.path))]
    Io { path: String, msg: String },

    /// Malformed JSON text.
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// The input ended before a complete value was read.
    #[error("Unexpected end of input at line {line}, column {col}: expected {expected}")]
    UnexpectedEof {
        line: usize,
        col: usize,
        expected: String,
    },

    /// Strict access to a key that is not present.
    #[error("missing field `{field}`")]
    MissingField { field: String },

    /// A value of one variant was found where another was required.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Strict access past the end of an array.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Text handed to a NUL-terminated buffer already contains a NUL byte.
    #[error("interior NUL byte at position {position}")]
    InteriorNul { position: usize },

    /// A decode failure nested under object keys and array indices,
    /// outermost first.
    #[error("{}: {source}", render_path(.path))]
    Path {
        path: Vec<PathSegment>,
        #[source]
        source: Box<Error>,
    },

    /// Custom error, usually raised through serde.
    #[error("{0}")]
    Custom(String),
}

/// One step of an [`Error::Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl Error {
    /// Creates a syntax error with line and column information.
    ///
    /// ```rust
    /// use json_twine::Error;
    ///
    /// let err = Error::syntax(3, 7, "expected ':'");
    /// assert!(err.to_string().contains("line 3"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates an unexpected end-of-input error.
    pub fn unexpected_eof(line: usize, col: usize, expected: &str) -> Self {
        Error::UnexpectedEof {
            line,
            col,
            expected: expected.to_string(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: &str) -> Self {
        Error::MissingField {
            field: field.to_string(),
        }
    }

    /// Creates a type mismatch error.
    ///
    /// ```rust
    /// use json_twine::Error;
    ///
    /// let err = Error::type_mismatch("number", "string");
    /// assert!(err.to_string().contains("expected number"));
    /// ```
    pub fn type_mismatch(expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates an I/O error. `path` is empty for anonymous streams.
    pub fn io(path: &str, msg: &str) -> Self {
        Error::Io {
            path: path.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Prefixes this error with the object key it occurred under.
    ///
    /// Nested prefixes are merged, so decoding `list[2].y` yields a single
    /// `Path` whose path renders as `list[2].y`.
    ///
    /// ```rust
    /// use json_twine::Error;
    ///
    /// let err = Error::missing_field("y").in_key("point").in_key("shape");
    /// assert_eq!(err.to_string(), "shape.point: missing field `y`");
    /// ```
    #[must_use]
    pub fn in_key(self, key: &str) -> Self {
        self.prefixed(PathSegment::Key(key.to_string()))
    }

    /// Prefixes this error with the array index it occurred under.
    #[must_use]
    pub fn in_index(self, index: usize) -> Self {
        self.prefixed(PathSegment::Index(index))
    }

    fn prefixed(self, segment: PathSegment) -> Self {
        match self {
            Error::Path { mut path, source } => {
                path.insert(0, segment);
                Error::Path { path, source }
            }
            other => Error::Path {
                path: vec![segment],
                source: Box::new(other),
            },
        }
    }

    /// Returns the error underneath any [`Error::Path`] wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Path { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns `true` if the root cause is [`Error::MissingField`].
    #[must_use]
    pub fn is_missing_field(&self) -> bool {
        matches!(self.root_cause(), Error::MissingField { .. })
    }

    /// Returns `true` if the root cause comes from malformed text.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(
            self.root_cause(),
            Error::Syntax { .. } | Error::UnexpectedEof { .. }
        )
    }

    /// Returns `true` if this is an I/O error.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    fn missing_field(field: &'static str) -> Self {
        Error::missing_field(field)
    }

    fn invalid_type(unexp: serde::de::Unexpected, exp: &dyn serde::de::Expected) -> Self {
        Error::type_mismatch(&exp.to_string(), &unexp.to_string())
    }
}

/// Keys after the first are joined with `.`, indices as `[n]`.
fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in path.iter().enumerate() {
        match segment {
            PathSegment::Key(key) if i == 0 => out.push_str(key),
            PathSegment::Key(key) => {
                out.push('.');
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

fn path_suffix(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" on '{}'", path)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_merging() {
        let err = Error::missing_field("y").in_key("x").in_index(2).in_key("list");
        assert_eq!(err.to_string(), "list[2].x: missing field `y`");
        assert!(err.is_missing_field());
    }

    #[test]
    fn test_nested_indices() {
        let err = Error::type_mismatch("number", "string")
            .in_index(1)
            .in_index(0);
        match &err {
            Error::Path { path, .. } => {
                assert_eq!(path, &[PathSegment::Index(0), PathSegment::Index(1)]);
            }
            other => panic!("Expected path error, got {:?}", other),
        }
        assert_eq!(err.to_string(), "[0][1]: type mismatch: expected number, found string");
    }

    #[test]
    fn test_bracketed_key_keeps_its_separator() {
        let err = Error::missing_field("y").in_key("[weird").in_key("outer");
        assert_eq!(err.to_string(), "outer.[weird: missing field `y`");

        let err = Error::missing_field("y").in_index(3).in_key("outer");
        assert_eq!(err.to_string(), "outer[3]: missing field `y`");
    }

    #[test]
    fn test_io_display() {
        let err = Error::io("file.json", "not found");
        assert_eq!(err.to_string(), "IO error on 'file.json': not found");
        assert!(err.is_io());

        let err = Error::io("", "broken pipe");
        assert_eq!(err.to_string(), "IO error: broken pipe");
    }

    #[test]
    fn test_serde_missing_field_maps_to_variant() {
        let err = <Error as serde::de::Error>::missing_field("currency");
        assert_eq!(err, Error::missing_field("currency"));
    }
}
