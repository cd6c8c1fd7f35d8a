//! The recursive value type.
//!
//! A [`Value`] owns its children outright: arrays and objects hold their
//! members by value, `Clone` is a deep copy, and replacing a value drops
//! everything it used to own.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::limits::LEGACY_NULL_SENTINEL;

/// Ordered children of an array value.
pub type Array = VecDeque<Value>;

/// Key-sorted members of an object value.
pub type Map = BTreeMap<String, Value>;

/// Shared Null returned by read-only lookups that find nothing.
pub static NULL: Value = Value::Null;

/// The tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Integer,
    Double,
    String,
    Array,
    Object,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        };
        f.write_str(name)
    }
}

/// A semi-structured value.
///
/// Equality is deep and structural. An `Integer` never equals a `Double`,
/// even when they hold the same number. Object members iterate in ascending
/// byte order of their keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    /// Raw bytes; not required to be UTF-8.
    String(Vec<u8>),
    Array(Array),
    Object(Map),
}

impl Value {
    /// Creates a Null value.
    pub fn new() -> Self {
        Value::Null
    }

    /// Creates an empty array.
    pub fn array() -> Self {
        Value::Array(Array::new())
    }

    /// Creates an empty object.
    pub fn object() -> Self {
        Value::Object(Map::new())
    }

    /// Returns the tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Integer(_) => ValueType::Integer,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// True only for the Null tag.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for Null, and for the integer the DTMI encoders write in place
    /// of Null ([`LEGACY_NULL_SENTINEL`]).
    ///
    /// Equality does not share this conflation: `Value::Null` never equals
    /// `Value::Integer(LEGACY_NULL_SENTINEL)`.
    pub fn is_null_or_legacy_sentinel(&self) -> bool {
        matches!(self, Value::Null | Value::Integer(LEGACY_NULL_SENTINEL))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Number of children for arrays and objects, 0 for Null, 1 otherwise.
    pub fn size(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Array(items) => items.len(),
            Value::Object(members) => members.len(),
            _ => 1,
        }
    }

    /// Resets this value to Null, dropping any owned children.
    pub fn null(&mut self) {
        *self = Value::Null;
    }

    /// Moves the value out, leaving Null in its place.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    // -------------------------------------------------------------------------
    // Coercions. All of these are total.
    // -------------------------------------------------------------------------

    /// Integer view of this value.
    ///
    /// Doubles truncate toward zero (saturating), strings contribute their
    /// leading integer text or 0, containers report their child count.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => *b as i64,
            Value::Integer(i) => *i,
            Value::Double(d) => *d as i64,
            Value::String(bytes) => leading_int(bytes),
            Value::Array(items) => items.len() as i64,
            Value::Object(members) => members.len() as i64,
        }
    }

    /// Floating-point view of this value.
    pub fn as_double(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => *b as u8 as f64,
            Value::Integer(i) => *i as f64,
            Value::Double(d) => *d,
            Value::String(bytes) => leading_double(bytes),
            Value::Array(items) => items.len() as f64,
            Value::Object(members) => members.len() as f64,
        }
    }

    /// Truthiness: false for Null, `false`, zero, the empty string, and
    /// empty containers.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Double(d) => *d != 0.0,
            Value::String(bytes) => !bytes.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(members) => !members.is_empty(),
        }
    }

    /// Text view of this value.
    ///
    /// Strings are converted lossily; containers render as compact JSON.
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::String(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Value::Array(_) | Value::Object(_) => self.to_json_string(),
        }
    }

    /// The raw string payload, or an empty slice for every other tag.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Value::String(bytes) => bytes,
            _ => &[],
        }
    }

    /// The string payload when it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// The array members, if this is an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The object members, if this is an object.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }
}

/// Parses the integer at the start of `bytes` the way `atoll` does:
/// leading whitespace, an optional sign, then digits. Saturates on overflow.
fn leading_int(bytes: &[u8]) -> i64 {
    let text = trim_leading_ws(bytes);
    let (negative, digits) = match text.first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut acc: i64 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = (b - b'0') as i64;
        acc = if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        };
    }
    acc
}

/// Parses the longest decimal prefix of `bytes`, or 0.0 if there is none.
fn leading_double(bytes: &[u8]) -> f64 {
    let text = trim_leading_ws(bytes);
    let mut end = 0;
    if matches!(text.first(), Some(b'-' | b'+')) {
        end += 1;
    }
    let int_start = end;
    end += count_digits(&text[end..]);
    let mut mantissa_digits = end - int_start;
    if text.get(end) == Some(&b'.') {
        let frac = count_digits(&text[end + 1..]);
        mantissa_digits += frac;
        if mantissa_digits > 0 {
            end += 1 + frac;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }
    if matches!(text.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(text.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&text[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    std::str::from_utf8(&text[..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

fn trim_leading_ws(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u64> for Value {
    /// Values above `i64::MAX` saturate.
    fn from(v: u64) -> Self {
        Value::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into_bytes())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::String(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v.into())
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Object(v)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
