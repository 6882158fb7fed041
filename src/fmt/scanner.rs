//! Percent-placeholder templates (`"connected to %s in %d ms"`) substituted from a
//! positional argument list. The scanner is decoupled from the output sink: parsing
//! produces a segment list, rendering streams it into any `io::Write` and reports
//! the byte count the rotation accounting needs.

use std::fmt;
use std::io;

/// Closed set of placeholder verbs; anything else after `%` passes through as literal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `%s`: string argument, written as-is.
    Str,
    /// `%d`: integer argument, optional width right-aligns it.
    Int,
    /// `%f`: float argument, optional width and precision (default precision 6).
    Float,
    /// `%v`: any argument, rendered in its natural form.
    Value,
    /// `%t`: boolean argument, `true`/`false`.
    Bool,
}

impl Verb {
    const fn as_char(self) -> char {
        match self {
            Self::Str => 's',
            Self::Int => 'd',
            Self::Float => 'f',
            Self::Value => 'v',
            Self::Bool => 't',
        }
    }
}

/// One parsed `%…` occurrence: the verb plus its optional width/precision sub-specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSpec {
    pub verb: Verb,
    pub width: Option<usize>,
    pub precision: Option<usize>,
}

impl PlaceholderSpec {
    /// Substitutes one argument. `Err` means the argument's type does not match the verb;
    /// the caller decides whether to emit a marker or fail.
    fn substitute(self, arg: &Value<'_>) -> Result<String, ()> {
        match (self.verb, arg) {
            // Width is accepted by the parser for %s but not applied; strings are
            // written through untouched.
            (Verb::Str, Value::Str(s)) => Ok((*s).to_string()),
            (Verb::Bool, Value::Bool(b)) => Ok(b.to_string()),
            (Verb::Int, Value::Int(i)) => Ok(self.pad(&i.to_string())),
            (Verb::Int, Value::Uint(u)) => Ok(self.pad(&u.to_string())),
            (Verb::Float, Value::Float(f)) => {
                let prec = self.precision.unwrap_or(6);
                let rendered = format!("{f:.prec$}");
                Ok(self.pad(&rendered))
            }
            (Verb::Value, v) => Ok(v.natural()),
            _ => Err(()),
        }
    }

    fn pad(self, rendered: &str) -> String {
        match self.width {
            Some(width) if rendered.len() < width => {
                format!("{rendered:>width$}")
            }
            _ => rendered.to_string(),
        }
    }

    /// Visible mismatch marker, e.g. `%!(d)`. A type-mismatched argument is
    /// consumed, the record still lands, and the writer's format-error counter
    /// records the incident.
    fn marker(self) -> String {
        format!("%!({})", self.verb.as_char())
    }
}

/// Tagged sequence emitted by the scanner: literal runs interleaved with typed placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(PlaceholderSpec),
}

/// A positional argument. The closed set keeps substitution free of reflection or
/// trait-object dispatch on the hot path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Str(&'a str),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
}

impl Value<'_> {
    /// Rendering used by `%v`, which accepts any variant.
    fn natural(&self) -> String {
        match self {
            Self::Str(s) => (*s).to_string(),
            Self::Int(i) => i.to_string(),
            Self::Uint(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Self::Str(s)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(s: &'a String) -> Self {
        Self::Str(s)
    }
}

impl From<i32> for Value<'_> {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value<'_> {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u32> for Value<'_> {
    fn from(u: u32) -> Self {
        Self::Uint(u64::from(u))
    }
}

impl From<u64> for Value<'_> {
    fn from(u: u64) -> Self {
        Self::Uint(u)
    }
}

impl From<f32> for Value<'_> {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<f64> for Value<'_> {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Builds a `&[Value]` argument slice from mixed literals, e.g.
/// `logger.infof("%s took %d ms", args!["sync", 12])`.
#[macro_export]
macro_rules! args {
    () => {
        &[] as &[$crate::fmt::Value<'_>]
    };
    ($($arg:expr),+ $(,)?) => {
        &[$($crate::fmt::Value::from($arg)),+][..]
    };
}

/// Why rendering can fail. Type mismatches are deliberately absent: they degrade to
/// an in-band marker instead of failing the whole record.
#[derive(Debug)]
pub enum FormatError {
    /// Fewer arguments than placeholders. Detected before any byte is written,
    /// replacing the reference behavior of indexing past the argument list.
    ArgumentCount { expected: usize, supplied: usize },
    /// I/O failure from the underlying sink.
    Io(io::Error),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgumentCount { expected, supplied } => {
                write!(f, "template expects {expected} arguments, {supplied} supplied")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::ArgumentCount { .. } => None,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// What one render produced: the byte count for rotation accounting, and how many
/// placeholders degraded to mismatch markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rendered {
    pub bytes: usize,
    pub mismatches: usize,
}

/// Pre-scanned template. Parsing is a small explicit state machine (literal /
/// percent-seen) kept separate from any sink so it is independently testable.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
    placeholders: usize,
}

impl Template {
    /// Infallible scan. `%%` collapses to one literal `%`; an unknown verb (or a `%`
    /// at end of input) passes through as literal text and consumes no argument.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        let chars: Vec<char> = template.chars().collect();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut placeholders = 0;
        let mut i = 0;

        while i < chars.len() {
            if chars[i] != '%' {
                literal.push(chars[i]);
                i += 1;
                continue;
            }

            // Percent seen: scan `[width][.precision]verb`.
            let start = i;
            i += 1;
            if i >= chars.len() {
                literal.push('%');
                break;
            }
            if chars[i] == '%' {
                literal.push('%');
                i += 1;
                continue;
            }

            let mut width = String::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                width.push(chars[i]);
                i += 1;
            }
            let mut precision = String::new();
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    precision.push(chars[i]);
                    i += 1;
                }
            }

            let verb = match chars.get(i) {
                Some('s') => Some(Verb::Str),
                Some('d') => Some(Verb::Int),
                Some('f') => Some(Verb::Float),
                Some('v') => Some(Verb::Value),
                Some('t') => Some(Verb::Bool),
                _ => None,
            };

            if let Some(verb) = verb {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(PlaceholderSpec {
                    verb,
                    width: width.parse().ok(),
                    precision: precision.parse().ok(),
                }));
                placeholders += 1;
                i += 1;
            } else if i < chars.len() {
                literal.extend(&chars[start..=i]);
                i += 1;
            } else {
                literal.extend(&chars[start..]);
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            segments,
            placeholders,
        }
    }

    /// Callers validate argument counts before taking the stream lock.
    #[must_use]
    pub const fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Tests and downstream code need direct access to verify scan results.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Streams the substituted output directly into `out`, no intermediate string.
    ///
    /// # Errors
    /// [`FormatError::ArgumentCount`] before any byte is written when `args` is short;
    /// [`FormatError::Io`] if the sink fails mid-record.
    pub fn render_to<W: io::Write>(
        &self,
        out: &mut W,
        args: &[Value<'_>],
    ) -> Result<Rendered, FormatError> {
        if args.len() < self.placeholders {
            return Err(FormatError::ArgumentCount {
                expected: self.placeholders,
                supplied: args.len(),
            });
        }

        let mut rendered = Rendered::default();
        let mut next = 0;

        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => {
                    out.write_all(s.as_bytes())?;
                    rendered.bytes += s.len();
                }
                Segment::Placeholder(spec) => {
                    let arg = &args[next];
                    next += 1;
                    let piece = spec.substitute(arg).unwrap_or_else(|()| {
                        rendered.mismatches += 1;
                        spec.marker()
                    });
                    out.write_all(piece.as_bytes())?;
                    rendered.bytes += piece.len();
                }
            }
        }

        Ok(rendered)
    }

    /// Convenience for hooks and tests that need the finished text as a `String`.
    ///
    /// # Errors
    /// Same as [`render_to`](Self::render_to); the in-memory sink itself cannot fail.
    pub fn render(&self, args: &[Value<'_>]) -> Result<String, FormatError> {
        let mut buf = Vec::new();
        self.render_to(&mut buf, args)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
