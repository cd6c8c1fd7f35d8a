//! JSON text parsing and rendering.
//!
//! Parsing goes through `serde_json`. Strings are byte strings, so rendering
//! escapes every byte outside printable ASCII as `\u00XX`, and parsing maps
//! text made only of code points up to U+00FF back to one byte per
//! character. Any byte string survives a text round trip unchanged.
//! Object keys are UTF-8 and are written as plain JSON strings.

use std::cell::Cell;
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use log::{debug, trace};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use crate::error::{ParseError, ParseErrorKind};
use crate::limits::DecodeOptions;
use crate::model::{Array, Map, Value};

// =============================================================================
// PARSING
// =============================================================================

/// Limits shared by every level of one parse.
struct Limits {
    max_depth: usize,
    depth_exceeded: Cell<bool>,
}

impl Limits {
    fn new(options: &DecodeOptions) -> Self {
        Self {
            max_depth: options.max_depth,
            depth_exceeded: Cell::new(false),
        }
    }

    fn error(&self, source: serde_json::Error) -> ParseError {
        if self.depth_exceeded.get() {
            ParseError::new(ParseErrorKind::DepthLimitExceeded, source)
        } else {
            ParseError::from(source)
        }
    }
}

/// Builds a [`Value`] from any serde deserializer, refusing to nest deeper
/// than [`DecodeOptions::max_depth`] containers.
#[derive(Clone, Copy)]
struct ValueSeed<'a> {
    depth: usize,
    limits: &'a Limits,
}

impl<'a> ValueSeed<'a> {
    fn root(limits: &'a Limits) -> Self {
        Self { depth: 0, limits }
    }

    /// Seed for the children of a container opened at this level.
    fn enter<E: de::Error>(self) -> Result<Self, E> {
        if self.depth >= self.limits.max_depth {
            self.limits.depth_exceeded.set(true);
            return Err(E::custom(format_args!(
                "nesting exceeds maximum depth {}",
                self.limits.max_depth
            )));
        }
        Ok(Self {
            depth: self.depth + 1,
            limits: self.limits,
        })
    }
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ValueSeed<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        // Integers too large for i64 become doubles.
        Ok(i64::try_from(v).map_or(Value::Double(v as f64), Value::Integer))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Double(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(unescape_bytes(v)))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let child = self.enter()?;
        let mut items = Array::new();
        while let Some(item) = seq.next_element_seed(child)? {
            items.push_back(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let child = self.enter()?;
        let mut members = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            let member = map.next_value_seed(child)?;
            members.insert(key, member);
        }
        Ok(Value::Object(members))
    }
}

/// Inverse of the byte escaping in [`string_escape`].
fn unescape_bytes(text: &str) -> Vec<u8> {
    if text.chars().all(|c| u32::from(c) <= 0xFF) {
        text.chars().map(|c| c as u8).collect()
    } else {
        text.as_bytes().to_vec()
    }
}

/// Parses one value. With `strict`, only whitespace may follow it.
fn parse<'de, R>(
    de: &mut serde_json::Deserializer<R>,
    options: &DecodeOptions,
    strict: bool,
) -> Result<Value, ParseError>
where
    R: serde_json::de::Read<'de>,
{
    // Nesting is bounded by ValueSeed instead.
    de.disable_recursion_limit();
    let limits = Limits::new(options);
    let value = ValueSeed::root(&limits)
        .deserialize(&mut *de)
        .map_err(|err| limits.error(err))?;
    if strict {
        de.end()
            .map_err(|err| ParseError::new(ParseErrorKind::TrailingCharacters, err))?;
    }
    Ok(value)
}

fn parse_lenient<'de, R>(mut de: serde_json::Deserializer<R>, options: &DecodeOptions) -> Value
where
    R: serde_json::de::Read<'de>,
{
    parse(&mut de, options, false).unwrap_or_else(|err| {
        debug!("JSON parse failed: {err}");
        Value::Null
    })
}

// =============================================================================
// RENDERING
// =============================================================================

/// Quotes and escapes a byte string as a JSON string literal.
///
/// Printable ASCII is written as is (apart from `"` and `\`); every other
/// byte becomes a short escape or `\u00XX`, so the output is pure ASCII.
///
/// ```
/// use packjson::codec::text::string_escape;
///
/// assert_eq!(string_escape(b"a\"b\n"), r#""a\"b\n""#);
/// assert_eq!(string_escape(&[0xFF, b'x']), r#""\u00ffx""#);
/// ```
pub fn string_escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x08 => out.push_str("\\b"),
            0x0C => out.push_str("\\f"),
            0x20..=0x7E => out.push(char::from(b)),
            _ => {
                const HEX: &[u8; 16] = b"0123456789abcdef";
                out.push_str("\\u00");
                out.push(char::from(HEX[usize::from(b >> 4)]));
                out.push(char::from(HEX[usize::from(b & 0x0F)]));
            }
        }
    }
    out.push('"');
    out
}

fn write_key<W: fmt::Write>(out: &mut W, key: &str) -> fmt::Result {
    let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
    out.write_str(&quoted)
}

fn write_double<W: fmt::Write>(out: &mut W, d: f64) -> fmt::Result {
    if d.is_finite() {
        // Debug formatting always keeps a '.' or an exponent, so the text
        // reads back as a double.
        write!(out, "{d:?}")
    } else {
        out.write_str("null")
    }
}

fn write_compact<W: fmt::Write>(out: &mut W, value: &Value) -> fmt::Result {
    match value {
        Value::Null => out.write_str("null"),
        Value::Bool(b) => write!(out, "{b}"),
        Value::Integer(i) => write!(out, "{i}"),
        Value::Double(d) => write_double(out, *d),
        Value::String(bytes) => out.write_str(&string_escape(bytes)),
        Value::Array(items) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_compact(out, item)?;
            }
            out.write_char(']')
        }
        Value::Object(members) => {
            out.write_char('{')?;
            for (i, (key, member)) in members.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_key(out, key)?;
                out.write_char(':')?;
                write_compact(out, member)?;
            }
            out.write_char('}')
        }
    }
}

const INDENT_STEP: usize = 2;

fn write_pretty<W: fmt::Write>(out: &mut W, value: &Value, indent: usize) -> fmt::Result {
    let inner = indent + INDENT_STEP;
    match value {
        Value::Array(items) if !items.is_empty() => {
            out.write_str("[\n")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_str(",\n")?;
                }
                write!(out, "{:inner$}", "")?;
                write_pretty(out, item, inner)?;
            }
            write!(out, "\n{:indent$}]", "")
        }
        Value::Object(members) if !members.is_empty() => {
            out.write_str("{\n")?;
            for (i, (key, member)) in members.iter().enumerate() {
                if i > 0 {
                    out.write_str(",\n")?;
                }
                write!(out, "{:inner$}", "")?;
                write_key(out, key)?;
                out.write_str(": ")?;
                write_pretty(out, member, inner)?;
            }
            write!(out, "\n{:indent$}}}", "")
        }
        other => write_compact(out, other),
    }
}

/// Compact JSON rendering.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_compact(f, self)
    }
}

/// Indented JSON rendering of a value, from [`Value::pretty`].
#[derive(Debug, Clone, Copy)]
pub struct Pretty<'a> {
    value: &'a Value,
    indent: usize,
}

impl fmt::Display for Pretty<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pretty(f, self.value, self.indent)
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl Value {
    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        self.to_string()
    }

    /// Multi-line JSON text. Nested lines are indented in steps of two
    /// spaces beyond `indent`; the closing bracket sits at `indent`.
    pub fn to_pretty_string(&self, indent: usize) -> String {
        self.pretty(indent).to_string()
    }

    /// Displayable pretty form, for writing without an intermediate String.
    pub fn pretty(&self, indent: usize) -> Pretty<'_> {
        Pretty { value: self, indent }
    }

    /// Parses JSON text.
    ///
    /// Never fails: malformed input yields Null. Text after a complete value
    /// is ignored.
    pub fn from_text(text: &str) -> Value {
        Self::from_text_bytes(text.as_bytes())
    }

    /// Parses JSON text from a byte buffer. See [`Value::from_text`].
    pub fn from_text_bytes(text: &[u8]) -> Value {
        Self::from_text_with_options(text, DecodeOptions::default())
    }

    /// [`Value::from_text_bytes`] with explicit decoding options.
    pub fn from_text_with_options(text: &[u8], options: DecodeOptions) -> Value {
        trace!("from_text: {} bytes", text.len());
        parse_lenient(serde_json::Deserializer::from_slice(text), &options)
    }

    /// Parses JSON text from a stream. A read error yields Null.
    pub fn from_reader<R: Read>(reader: R) -> Value {
        let reader = io::BufReader::new(reader);
        parse_lenient(serde_json::Deserializer::from_reader(reader), &DecodeOptions::default())
    }

    /// Strictly parses one JSON document; only whitespace may follow it.
    pub fn try_from_text(text: &str) -> Result<Value, ParseError> {
        Self::try_from_text_bytes(text.as_bytes(), DecodeOptions::default())
    }

    /// Strict parse of a byte buffer with explicit options.
    pub fn try_from_text_bytes(text: &[u8], options: DecodeOptions) -> Result<Value, ParseError> {
        parse(&mut serde_json::Deserializer::from_slice(text), &options, true)
    }
}

impl FromStr for Value {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Value::try_from_text(s)
    }
}
