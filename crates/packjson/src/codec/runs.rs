//! Run-escaped fixed-width integer sequences.
//!
//! Each value is written as zero or more fields holding the field maximum
//! followed by one field holding the remainder, so any non-negative value
//! fits regardless of field width. Used for compact per-segment length
//! tables (fragment durations, part sizes) embedded as packed strings.

use crate::error::DecodeError;
use crate::limits::{VECTOR4_MAX, VECTOR_MAX};

/// Field width of a run-escaped sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    Two,
    Four,
}

impl Width {
    fn bytes(self) -> usize {
        match self {
            Width::Two => 2,
            Width::Four => 4,
        }
    }

    fn max(self) -> u64 {
        match self {
            Width::Two => VECTOR_MAX,
            Width::Four => VECTOR4_MAX,
        }
    }

    fn push(self, out: &mut Vec<u8>, field: u64) {
        match self {
            Width::Two => out.extend_from_slice(&(field as u16).to_be_bytes()),
            Width::Four => out.extend_from_slice(&(field as u32).to_be_bytes()),
        }
    }

    fn field(self, chunk: &[u8]) -> u64 {
        chunk.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
    }
}

fn encode<I>(values: I, width: Width) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: Into<u64>,
{
    let max = width.max();
    let mut out = Vec::new();
    for value in values {
        let mut rest = value.into();
        while rest >= max {
            width.push(&mut out, max);
            rest -= max;
        }
        width.push(&mut out, rest);
    }
    out
}

/// Decodes complete values, returning them and whether the input ended
/// cleanly (no partial field, no unterminated run).
fn decode(input: &[u8], width: Width) -> (Vec<u64>, bool) {
    let max = width.max();
    let chunks = input.chunks_exact(width.bytes());
    let clean_tail = chunks.remainder().is_empty();
    let mut out = Vec::new();
    let mut run = 0u64;
    let mut in_run = false;
    for chunk in chunks {
        let field = width.field(chunk);
        run = run.saturating_add(field);
        if field == max {
            in_run = true;
        } else {
            out.push(run);
            run = 0;
            in_run = false;
        }
    }
    (out, clean_tail && !in_run)
}

/// Encodes values as 2-byte run-escaped fields.
///
/// ```
/// use packjson::codec::encode_vector;
///
/// assert_eq!(encode_vector([1u64, 0xFFFF]), vec![0x00, 0x01, 0xFF, 0xFF, 0x00, 0x00]);
/// ```
pub fn encode_vector<I>(values: I) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: Into<u64>,
{
    encode(values, Width::Two)
}

/// Decodes 2-byte run-escaped fields.
///
/// A trailing partial field and an unterminated run are ignored.
pub fn decode_vector(input: &[u8]) -> Vec<u64> {
    decode(input, Width::Two).0
}

/// Like [`decode_vector`], but rejects input that does not end on a
/// complete value.
pub fn try_decode_vector(input: &[u8]) -> Result<Vec<u64>, DecodeError> {
    match decode(input, Width::Two) {
        (values, true) => Ok(values),
        _ => Err(DecodeError::UnexpectedEof { context: "vector" }),
    }
}

/// Encodes values as 4-byte run-escaped fields.
pub fn encode_vector4<I>(values: I) -> Vec<u8>
where
    I: IntoIterator,
    I::Item: Into<u64>,
{
    encode(values, Width::Four)
}

/// Decodes 4-byte run-escaped fields.
pub fn decode_vector4(input: &[u8]) -> Vec<u64> {
    decode(input, Width::Four).0
}

/// Like [`decode_vector4`], but rejects input that does not end on a
/// complete value.
pub fn try_decode_vector4(input: &[u8]) -> Result<Vec<u64>, DecodeError> {
    match decode(input, Width::Four) {
        (values, true) => Ok(values),
        _ => Err(DecodeError::UnexpectedEof { context: "vector4" }),
    }
}
