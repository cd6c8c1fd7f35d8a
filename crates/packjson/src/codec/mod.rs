//! Encodings of [`Value`] trees.
//!
//! - [`text`]: JSON text, compact and pretty
//! - [`packed`]: the tagged binary format and its length-framed net variant
//! - [`dtmi`]: the legacy DTMI and DTMI2 formats
//! - [`runs`]: run-escaped integer sequences for embedding in strings

pub mod dtmi;
pub mod packed;
pub mod primitives;
pub mod runs;
pub mod text;

use crate::model::Value;

pub use dtmi::{
    Dtmi, Dtmi2, TIME_KEY, TRACK_ID_KEY, from_dtmi, from_dtmi_bytes, from_dtmi_into,
    from_dtmi_with_options, from_dtmi2, from_dtmi2_bytes, from_dtmi2_into,
};
pub use packed::{NetFrame, Packed};
pub use primitives::{Reader, Writer};
pub use runs::{
    decode_vector, decode_vector4, encode_vector, encode_vector4, try_decode_vector,
    try_decode_vector4,
};
pub use text::{Pretty, string_escape};

/// A binary encoding that reads values out of a caller-owned buffer.
///
/// Decoding is total: malformed or truncated input yields the part that was
/// decoded, and `cursor` is left just past the last byte consumed.
pub trait BinaryCodec {
    fn encode(&self, value: &Value) -> Vec<u8>;

    fn decode_at(&self, data: &[u8], cursor: &mut usize) -> Value;

    /// Decodes one value from the start of `data`.
    fn decode(&self, data: &[u8]) -> Value {
        let mut cursor = 0;
        self.decode_at(data, &mut cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codecs_are_interchangeable() {
        let mut v = Value::new();
        v["n"] = 7.into();
        v["s"] = "x".into();
        let codecs: [&dyn BinaryCodec; 2] = [&Packed, &Dtmi];
        for codec in codecs {
            assert_eq!(codec.decode(&codec.encode(&v)), v);
        }
    }

    #[test]
    fn test_dtmi2_codec_adds_header_members() {
        let mut v = Value::new();
        v[TIME_KEY] = 1000.into();
        v[TRACK_ID_KEY] = 2.into();
        v["data"] = "payload".into();
        assert_eq!(Dtmi2.decode(&Dtmi2.encode(&v)), v);
    }
}
