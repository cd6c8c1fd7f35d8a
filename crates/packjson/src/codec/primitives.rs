//! Primitive encoding/decoding shared by the binary formats.
//!
//! Every multi-byte number on the wire is a fixed-width big-endian field.

use crate::error::DecodeError;

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and a position, and provides bounds-checked reads.
/// A failed read leaves the position where it was.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Creates a reader that starts at `pos`, clamped to the end of `data`.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the next byte without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Returns true if the unread input starts with `prefix`.
    #[inline]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.remaining().starts_with(prefix)
    }

    /// Advances past `n` bytes.
    #[inline]
    pub fn skip(&mut self, n: usize, context: &'static str) -> Result<(), DecodeError> {
        self.read_bytes(n, context).map(|_| ())
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads exactly N bytes into an array.
    #[inline]
    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    /// Reads a big-endian u16.
    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        self.read_array(context).map(u16::from_be_bytes)
    }

    /// Reads a big-endian u32.
    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        self.read_array(context).map(u32::from_be_bytes)
    }

    /// Reads a big-endian u64.
    pub fn read_u64(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        self.read_array(context).map(u64::from_be_bytes)
    }

    /// Reads a big-endian two's complement i64.
    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        self.read_array(context).map(i64::from_be_bytes)
    }

    /// Reads a big-endian f64. NaN is passed through.
    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        self.read_array(context).map(f64::from_be_bytes)
    }

    /// Reads a byte string with a 4-byte length prefix.
    ///
    /// The declared length is checked against the remaining input before
    /// anything is copied.
    pub fn read_long_bytes(&mut self, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let len = self.read_u32(context)? as usize;
        self.read_bytes(len, context).inspect_err(|_| self.pos = start)
    }

    /// Reads a byte string with a 2-byte length prefix.
    pub fn read_short_bytes(&mut self, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let len = self.read_u16(context)? as usize;
        self.read_bytes(len, context).inspect_err(|_| self.pos = start)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a big-endian u16.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian u32.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian u64.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian i64.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a big-endian f64.
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a byte string with a 4-byte length prefix.
    ///
    /// Callers must ensure `bytes.len()` fits in a u32.
    pub fn write_long_bytes(&mut self, bytes: &[u8]) {
        self.write_u32(bytes.len() as u32);
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a byte string with a 2-byte length prefix.
    ///
    /// Callers must ensure `bytes.len()` fits in a u16.
    pub fn write_short_bytes(&mut self, bytes: &[u8]) {
        self.write_u16(bytes.len() as u16);
        self.buf.extend_from_slice(bytes);
    }
}
