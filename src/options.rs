//! Configuration options for JSON output.
//!
//! ## Examples
//!
//! ```rust
//! use json_twine::{json, to_string_with_options, DumpOptions};
//!
//! let value = json!({"name": "Zoë"});
//!
//! let options = DumpOptions::new().with_ensure_ascii(true);
//! assert_eq!(
//!     to_string_with_options(&value, options).unwrap(),
//!     r#"{"name":"Zo\u00eb"}"#
//! );
//! ```

/// Width used by [`DumpOptions::pretty`].
pub const DEFAULT_PRETTY_INDENT: usize = 4;

/// Widest indent the writer honors; larger requests are clamped to it.
pub const MAX_INDENT: usize = 64;

/// Controls how a [`Value`](crate::Value) is written as text.
///
/// `indent == 0` writes everything on one line with no insignificant
/// whitespace. A positive `indent` writes one member per line, indented by
/// that many spaces per nesting level.
///
/// ```rust
/// use json_twine::DumpOptions;
///
/// let options = DumpOptions::new();
/// assert_eq!(options.indent, 0);
///
/// let options = DumpOptions::pretty().with_indent(2);
/// assert_eq!(options.indent, 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DumpOptions {
    pub indent: usize,
    pub ensure_ascii: bool,
}

impl DumpOptions {
    /// Compact output, UTF-8 passed through unescaped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-line output with four spaces per level.
    #[must_use]
    pub fn pretty() -> Self {
        DumpOptions {
            indent: DEFAULT_PRETTY_INDENT,
            ..Default::default()
        }
    }

    /// Sets the number of spaces per nesting level. `0` means compact.
    /// Values above [`MAX_INDENT`] are clamped.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent.min(MAX_INDENT);
        self
    }

    /// When set, every non-ASCII character is written as a `\uXXXX` escape.
    #[must_use]
    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }

    /// Returns `true` if output spans multiple lines.
    #[must_use]
    pub const fn is_pretty(&self) -> bool {
        self.indent > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_is_clamped() {
        assert_eq!(DumpOptions::new().with_indent(usize::MAX).indent, MAX_INDENT);
        assert_eq!(DumpOptions::new().with_indent(3).indent, 3);
        assert!(!DumpOptions::new().with_indent(0).is_pretty());
    }
}
