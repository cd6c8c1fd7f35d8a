//! Wire constants and decoding limits.
//!
//! Tag bytes shared by the packed and DTMI formats, the container end
//! marker, and the bounds applied while decoding untrusted input.

/// Integer: 8-byte big-endian two's complement.
pub const TAG_INTEGER: u8 = 0x01;
/// String: 4-byte big-endian length followed by raw bytes.
pub const TAG_STRING: u8 = 0x02;
/// Double: 8-byte big-endian IEEE 754 bits (packed only).
pub const TAG_DOUBLE: u8 = 0x03;
/// Null: no payload (packed only).
pub const TAG_NULL: u8 = 0x04;
/// Bool: one payload byte, 0 or 1 (packed only).
pub const TAG_BOOL: u8 = 0x05;
/// Array: children followed by [`END_MARKER`].
pub const TAG_ARRAY: u8 = 0x0A;
/// Object: key/child pairs followed by [`END_MARKER`].
pub const TAG_OBJECT: u8 = 0xE0;
/// Alternate object tag accepted by the DTMI decoder.
pub const TAG_OBJECT_ALT: u8 = 0xFF;

/// Terminates arrays and objects.
pub const END_MARKER: [u8; 3] = [0x00, 0x00, 0xEE];

/// Integer value the DTMI encoders write in place of Null.
///
/// DTMI has no null tag, so a Null survives a DTMI round trip only as this
/// integer. See [`Value::is_null_or_legacy_sentinel`](crate::Value::is_null_or_legacy_sentinel).
pub const LEGACY_NULL_SENTINEL: i64 = i64::MIN;

/// Default maximum container nesting accepted by the decoders.
pub const MAX_DEPTH: usize = 128;

/// Longest object key the binary formats can carry (2-byte length prefix).
pub const MAX_KEY_LEN: usize = u16::MAX as usize;

/// Longest string the binary formats can carry (4-byte length prefix).
pub const MAX_STRING_LEN: usize = u32::MAX as usize;

/// Size of the net frame length header.
pub const NET_HEADER_LEN: usize = 4;

/// Size of the DTMI2 header (4-byte track id, 8-byte timestamp).
pub const DTMI2_HEADER_LEN: usize = 12;

/// Field maximum of the 2-byte run codec.
pub const VECTOR_MAX: u64 = 0xFFFF;

/// Field maximum of the 4-byte run codec.
pub const VECTOR4_MAX: u64 = 0xFFFF_FFFF;

/// Runtime decoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest container nesting the decoder will descend into.
    ///
    /// Reaching the limit stops decoding the same way truncated input does.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Creates default decoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns options with the given nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
