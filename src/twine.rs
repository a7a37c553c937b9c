//! Deferred string concatenation.
//!
//! A [`Twine`] is a small expression tree whose leaves borrow string data
//! (or hold scalars that format themselves). Joining twines never copies
//! string bytes; the text is produced once, by a terminal operation such as
//! [`Twine::str`] or [`Twine::to_str_ref`].
//!
//! Functions that only need to read a string take `&str`. Functions that
//! would otherwise build a string from pieces take `&Twine` and let the
//! callee decide where the bytes end up.
//!
//! ```rust
//! use json_twine::Twine;
//!
//! fn describe(prefix: &Twine<'_>) -> String {
//!     (prefix + ": " + Twine::from(42i32)).str()
//! }
//!
//! let name = String::from("answer");
//! assert_eq!(describe(&Twine::from(&name)), "answer: 42");
//! ```

use crate::{Error, Result};
use log::{trace, warn};
use std::convert::Infallible;
use std::ffi::CStr;
use std::fmt::{self, Write as _};
use std::mem;
use std::ops::Add;

#[derive(Clone)]
enum Child<'a> {
    Empty,
    Str(&'a str),
    Char(char),
    Int(i64),
    UInt(u64),
    Hex(u64),
    Display(&'a dyn fmt::Display),
    Twine(&'a Twine<'a>),
    Boxed(Box<Twine<'a>>),
}

impl Child<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Child::Empty => true,
            Child::Str(s) => s.is_empty(),
            Child::Twine(t) => t.is_empty(),
            Child::Boxed(t) => t.is_empty(),
            _ => false,
        }
    }

    fn is_composite(&self) -> bool {
        matches!(self, Child::Twine(_) | Child::Boxed(_))
    }

    fn len_hint(&self) -> usize {
        match self {
            Child::Empty | Child::Display(_) => 0,
            Child::Str(s) => s.len(),
            Child::Char(c) => c.len_utf8(),
            Child::Int(i) => decimal_width(i.unsigned_abs()) + usize::from(*i < 0),
            Child::UInt(u) => decimal_width(*u),
            Child::Hex(h) => hex_width(*h),
            Child::Twine(t) => t.len_hint(),
            Child::Boxed(t) => t.len_hint(),
        }
    }
}

impl fmt::Display for Child<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => Ok(()),
            Child::Str(s) => f.write_str(s),
            Child::Char(c) => f.write_char(*c),
            Child::Int(i) => write!(f, "{}", i),
            Child::UInt(u) => write!(f, "{}", u),
            Child::Hex(h) => write!(f, "{:x}", h),
            Child::Display(d) => write!(f, "{}", d),
            Child::Twine(t) => fmt::Display::fmt(t, f),
            Child::Boxed(t) => fmt::Display::fmt(t.as_ref(), f),
        }
    }
}

fn decimal_width(mut n: u64) -> usize {
    let mut width = 1;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}

fn hex_width(n: u64) -> usize {
    if n == 0 {
        1
    } else {
        (64 - n.leading_zeros() as usize + 3) / 4
    }
}

/// A lazily concatenated string.
///
/// A twine borrows every string fragment it refers to for `'a`, so the
/// borrow checker keeps the fragments alive for as long as the twine is.
/// Building one is cheap and performs no allocation, except that folding a
/// composite twine by value into a larger one boxes it.
///
/// ```rust
/// use json_twine::Twine;
///
/// let base = Twine::from("config");
/// let json = &base + ".json";
/// let yaml = &base + ".yaml";
///
/// assert_eq!(json.str(), "config.json");
/// assert_eq!(yaml.str(), "config.yaml");
/// ```
///
/// Chains of any length are fine: realizing, cloning and dropping a twine
/// walk it with an explicit stack rather than recursion.
pub struct Twine<'a> {
    lhs: Child<'a>,
    rhs: Child<'a>,
}

impl<'a> Twine<'a> {
    /// Creates an empty twine.
    #[must_use]
    pub const fn new() -> Self {
        Twine {
            lhs: Child::Empty,
            rhs: Child::Empty,
        }
    }

    /// Wraps an integer rendered as lowercase hexadecimal with no prefix.
    ///
    /// ```rust
    /// use json_twine::Twine;
    ///
    /// assert_eq!((Twine::from("0x") + Twine::hex(255)).str(), "0xff");
    /// ```
    #[must_use]
    pub const fn hex(value: u64) -> Self {
        Twine::unary(Child::Hex(value))
    }

    /// Wraps any borrowed `Display` value. It is formatted when the twine is
    /// realized, not now.
    #[must_use]
    pub fn display(value: &'a dyn fmt::Display) -> Self {
        Twine::unary(Child::Display(value))
    }

    const fn unary(child: Child<'a>) -> Self {
        Twine {
            lhs: child,
            rhs: Child::Empty,
        }
    }

    fn is_unary(&self) -> bool {
        matches!(self.rhs, Child::Empty)
    }

    /// Turns this twine into a single child of a larger node.
    fn into_child(mut self) -> Child<'a> {
        let lhs = mem::replace(&mut self.lhs, Child::Empty);
        let rhs = mem::replace(&mut self.rhs, Child::Empty);
        match (lhs, rhs) {
            (child, Child::Empty) | (Child::Empty, child) => child,
            (lhs, rhs) => Child::Boxed(Box::new(Twine { lhs, rhs })),
        }
    }

    /// Joins `rhs` after this twine without evaluating either side.
    ///
    /// `self` is borrowed rather than consumed, so one prefix can be shared
    /// by several branches.
    pub fn concat<'b, R>(&'b self, rhs: R) -> Twine<'b>
    where
        'a: 'b,
        R: Into<Twine<'b>>,
    {
        let this: &'b Twine<'b> = self;
        let lhs = match &this.lhs {
            Child::Boxed(_) => Child::Twine(this),
            child if this.is_unary() => child.clone(),
            _ => Child::Twine(this),
        };
        Twine {
            lhs,
            rhs: rhs.into().into_child(),
        }
    }

    /// Visits the leaves left to right, descending into nested twines.
    fn try_for_each_leaf<E>(
        &self,
        mut f: impl FnMut(&Child<'a>) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        if !self.lhs.is_composite() && !self.rhs.is_composite() {
            f(&self.lhs)?;
            return f(&self.rhs);
        }
        let mut pending: Vec<&Child<'a>> = vec![&self.rhs, &self.lhs];
        while let Some(child) = pending.pop() {
            match child {
                Child::Twine(t) => {
                    pending.push(&t.rhs);
                    pending.push(&t.lhs);
                }
                Child::Boxed(t) => {
                    pending.push(&t.rhs);
                    pending.push(&t.lhs);
                }
                leaf => f(leaf)?,
            }
        }
        Ok(())
    }

    fn for_each_leaf(&self, mut f: impl FnMut(&Child<'a>)) {
        let walked = self.try_for_each_leaf(|leaf| {
            f(leaf);
            Ok::<(), Infallible>(())
        });
        match walked {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }

    /// Returns `true` if realizing this twine yields `""` for certain.
    ///
    /// A borrowed `Display` fragment is never considered empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.try_for_each_leaf(|leaf| if leaf.is_empty() { Ok(()) } else { Err(()) })
            .is_ok()
    }

    /// Returns `true` if this twine is exactly one borrowed string.
    #[must_use]
    pub fn is_single_str(&self) -> bool {
        self.as_single_str().is_some()
    }

    /// Returns the borrowed string when this twine is a single string view.
    #[must_use]
    pub fn as_single_str(&self) -> Option<&'a str> {
        let child = match (&self.lhs, &self.rhs) {
            (child, Child::Empty) | (Child::Empty, child) => child,
            _ => return None,
        };
        match child {
            Child::Str(s) => Some(*s),
            Child::Twine(t) => t.as_single_str(),
            _ => None,
        }
    }

    /// Estimated byte length of the realized string. Exact unless the twine
    /// holds `Display` fragments, which count as zero.
    #[must_use]
    pub fn len_hint(&self) -> usize {
        let mut len = 0;
        self.for_each_leaf(|leaf| len += leaf.len_hint());
        len
    }

    /// Realizes the twine into a freshly allocated `String`.
    ///
    /// The result is a temporary unless bound; borrowing from it in the same
    /// expression does not compile:
    ///
    /// ```compile_fail
    /// use json_twine::Twine;
    ///
    /// let name = "world";
    /// let greeting = Twine::from("hello ") + name;
    /// let view: &str = greeting.str().as_str();
    /// println!("{}", view);
    /// ```
    ///
    /// Use [`Twine::to_str_ref`] with a caller-owned buffer instead.
    #[must_use]
    pub fn str(&self) -> String {
        if let Some(s) = self.as_single_str() {
            return s.to_string();
        }
        let mut out = String::with_capacity(self.len_hint());
        self.to_vector(&mut out);
        out
    }

    /// Appends the realized text to `out`.
    ///
    /// Writing into a `String` only fails if a `Display` fragment does; the
    /// text up to that fragment is kept and the failure is logged. Use
    /// [`Twine::write_to`] to observe it.
    pub fn to_vector(&self, out: &mut String) {
        let start = out.len();
        if self.write_to(out).is_err() {
            warn!(
                "display fragment failed; twine truncated after {} bytes",
                out.len() - start
            );
        }
    }

    /// Writes the realized text to any `fmt::Write` sink.
    ///
    /// # Errors
    ///
    /// Propagates errors from the sink or from a `Display` fragment.
    pub fn write_to<W: fmt::Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        self.try_for_each_leaf(|leaf| match leaf {
            Child::Str(s) => out.write_str(s),
            Child::Char(c) => out.write_char(*c),
            other => write!(out, "{}", other),
        })
    }

    /// Returns the text as a `&str`, using `buf` only when needed.
    ///
    /// A single string view is returned as is and `buf` is left untouched.
    /// Otherwise `buf` is cleared, filled and borrowed.
    ///
    /// ```rust
    /// use json_twine::Twine;
    ///
    /// let mut buf = String::new();
    ///
    /// let single = Twine::from("as is");
    /// assert_eq!(single.to_str_ref(&mut buf), "as is");
    /// assert!(buf.is_empty());
    ///
    /// let joined = Twine::from("a") + "b";
    /// assert_eq!(joined.to_str_ref(&mut buf), "ab");
    /// ```
    pub fn to_str_ref<'b>(&'b self, buf: &'b mut String) -> &'b str {
        if let Some(s) = self.as_single_str() {
            return s;
        }
        buf.clear();
        self.to_vector(buf);
        buf.as_str()
    }

    /// Writes the text and a trailing NUL into `buf` and borrows it as a C
    /// string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InteriorNul`] if the text itself contains a NUL byte.
    pub fn to_null_terminated<'b>(&self, buf: &'b mut Vec<u8>) -> Result<&'b CStr> {
        buf.clear();
        buf.reserve(self.len_hint() + 1);
        write!(ByteSink(&mut *buf), "{}", self).map_err(Error::custom)?;
        if let Some(position) = buf.iter().position(|&b| b == 0) {
            trace!("interior NUL at byte {} of {} byte twine", position, buf.len());
            return Err(Error::InteriorNul { position });
        }
        buf.push(0);
        CStr::from_bytes_with_nul(buf).map_err(Error::custom)
    }
}

/// NUL-terminates a plain string view into `buf`.
///
/// ```rust
/// use json_twine::c_str;
///
/// let mut buf = Vec::new();
/// let c = c_str("hello", &mut buf).unwrap();
/// assert_eq!(c.to_bytes_with_nul(), b"hello\0");
/// ```
///
/// # Errors
///
/// Returns [`Error::InteriorNul`] if `s` contains a NUL byte.
pub fn c_str<'b>(s: &str, buf: &'b mut Vec<u8>) -> Result<&'b CStr> {
    Twine::from(s).to_null_terminated(buf)
}

struct ByteSink<'v>(&'v mut Vec<u8>);

impl fmt::Write for ByteSink<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl Default for Twine<'_> {
    fn default() -> Self {
        Twine::new()
    }
}

impl Clone for Twine<'_> {
    fn clone(&self) -> Self {
        if !matches!(self.lhs, Child::Boxed(_)) && !matches!(self.rhs, Child::Boxed(_)) {
            return Twine {
                lhs: self.lhs.clone(),
                rhs: self.rhs.clone(),
            };
        }
        // owned subtrees are rebuilt as a left-leaning chain of the same leaves
        let mut leaves = Vec::new();
        let mut pending = vec![&self.rhs, &self.lhs];
        while let Some(child) = pending.pop() {
            match child {
                Child::Boxed(t) => {
                    pending.push(&t.rhs);
                    pending.push(&t.lhs);
                }
                Child::Empty => {}
                leaf => leaves.push(leaf.clone()),
            }
        }
        let mut leaves = leaves.into_iter();
        let first = leaves.next().map_or_else(Twine::new, Twine::unary);
        leaves.fold(first, |acc, leaf| acc + Twine::unary(leaf))
    }
}

impl Drop for Twine<'_> {
    fn drop(&mut self) {
        let mut owned = Vec::new();
        detach_boxed(&mut self.lhs, &mut owned);
        detach_boxed(&mut self.rhs, &mut owned);
        while let Some(mut twine) = owned.pop() {
            let twine = &mut *twine;
            detach_boxed(&mut twine.lhs, &mut owned);
            detach_boxed(&mut twine.rhs, &mut owned);
        }
    }
}

fn detach_boxed<'a>(child: &mut Child<'a>, owned: &mut Vec<Box<Twine<'a>>>) {
    if let Child::Boxed(_) = child {
        if let Child::Boxed(twine) = mem::replace(child, Child::Empty) {
            owned.push(twine);
        }
    }
}

impl fmt::Display for Twine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

impl fmt::Debug for Twine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Twine").field(&self.str()).finish()
    }
}

impl<'a> From<&'a str> for Twine<'a> {
    fn from(s: &'a str) -> Self {
        Twine::unary(Child::Str(s))
    }
}

impl<'a> From<&'a String> for Twine<'a> {
    fn from(s: &'a String) -> Self {
        Twine::unary(Child::Str(s.as_str()))
    }
}

impl From<char> for Twine<'_> {
    fn from(c: char) -> Self {
        Twine::unary(Child::Char(c))
    }
}

macro_rules! twine_from_signed {
    ($($t:ty)*) => {$(
        impl From<$t> for Twine<'_> {
            fn from(value: $t) -> Self {
                Twine::unary(Child::Int(i64::from(value)))
            }
        }
    )*};
}

macro_rules! twine_from_unsigned {
    ($($t:ty)*) => {$(
        impl From<$t> for Twine<'_> {
            fn from(value: $t) -> Self {
                Twine::unary(Child::UInt(value as u64))
            }
        }
    )*};
}

twine_from_signed!(i8 i16 i32 i64);
twine_from_unsigned!(u8 u16 u32 u64 usize);

impl<'a, 'b> From<&'b Twine<'a>> for Twine<'b>
where
    'a: 'b,
{
    fn from(twine: &'b Twine<'a>) -> Self {
        let twine: &'b Twine<'b> = twine;
        Twine::unary(Child::Twine(twine))
    }
}

impl<'a, 'b, R> Add<R> for &'b Twine<'a>
where
    'a: 'b,
    R: Into<Twine<'b>>,
{
    type Output = Twine<'b>;

    fn add(self, rhs: R) -> Twine<'b> {
        self.concat(rhs)
    }
}

impl<'a, R> Add<R> for Twine<'a>
where
    R: Into<Twine<'a>>,
{
    type Output = Twine<'a>;

    fn add(self, rhs: R) -> Twine<'a> {
        Twine {
            lhs: self.into_child(),
            rhs: rhs.into().into_child(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_view_is_not_copied() {
        let source = String::from("borrowed");
        let twine = Twine::from(&source);
        let view = twine.as_single_str().unwrap();
        assert_eq!(view.as_ptr(), source.as_ptr());

        let mut buf = String::from("untouched");
        assert_eq!(twine.to_str_ref(&mut buf).as_ptr(), source.as_ptr());
        assert_eq!(buf, "untouched");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(Twine::from(-42i64).str(), "-42");
        assert_eq!(Twine::from(7u8).str(), "7");
        assert_eq!(Twine::from('x').str(), "x");
        assert_eq!(Twine::hex(0).str(), "0");
        assert_eq!(Twine::hex(0xdead_beef).str(), "deadbeef");
    }

    #[test]
    fn test_len_hint_is_exact_without_display() {
        let twine = Twine::from("ab") + 'é' + -120i32 + 65535u32 + Twine::hex(0x1ff);
        let realized = twine.str();
        assert_eq!(realized, "abé-120655351ff");
        assert_eq!(twine.len_hint(), realized.len());
    }

    #[test]
    fn test_shared_prefix() {
        let base = Twine::from("path/");
        let a = &base + "a";
        let b = &base + "b" + "/c";
        assert_eq!(a.str(), "path/a");
        assert_eq!(b.str(), "path/b/c");
        assert_eq!(base.str(), "path/");
    }

    #[test]
    fn test_nested_by_value_is_boxed() {
        let inner = Twine::from("x") + "y";
        let outer = Twine::from("<") + inner + ">";
        assert_eq!(outer.str(), "<xy>");
        assert!(!outer.is_single_str());
    }

    #[test]
    fn test_display_fragment_is_deferred() {
        let value = 2.5f64;
        let twine = Twine::from("v=") + Twine::display(&value);
        assert_eq!(twine.to_string(), "v=2.5");
        assert!(!Twine::display(&"").is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(Twine::new().is_empty());
        assert!((Twine::from("") + "").is_empty());
        assert!(!(Twine::new() + 0i32).is_empty());
        assert_eq!(Twine::default().str(), "");
    }

    #[test]
    fn test_null_terminated() {
        let mut buf = Vec::new();
        let twine = Twine::from("ab") + 1i32;
        let c = twine.to_null_terminated(&mut buf).unwrap();
        assert_eq!(c.to_bytes(), b"ab1");

        let bad = Twine::from("a\0b");
        assert_eq!(
            bad.to_null_terminated(&mut buf),
            Err(Error::InteriorNul { position: 1 })
        );
    }

    #[test]
    fn test_to_vector_appends() {
        let mut out = String::from(">> ");
        (Twine::from("a") + "b").to_vector(&mut out);
        assert_eq!(out, ">> ab");
    }

    struct Failing;

    impl fmt::Display for Failing {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn test_failing_display_fragment() {
        let twine = Twine::from("kept") + Twine::display(&Failing) + "lost";
        let mut out = String::new();
        assert!(twine.write_to(&mut out).is_err());

        let mut appended = String::from(">");
        twine.to_vector(&mut appended);
        assert_eq!(appended, ">kept");
    }

    #[test]
    fn test_clone_of_owned_chain() {
        let mut twine = Twine::from("<");
        for i in 0..1000u32 {
            twine = twine + i + ',';
        }
        let copy = twine.clone();
        assert_eq!(copy.str(), twine.str());
        assert_eq!(copy.len_hint(), twine.len_hint());
        drop(twine);
        assert!(copy.str().starts_with("<0,1,2,"));
    }

    #[test]
    fn test_debug() {
        let twine = Twine::from("a") + 1i32;
        assert_eq!(format!("{:?}", twine), "Twine(\"a1\")");
    }
}
