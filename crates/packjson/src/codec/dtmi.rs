//! Legacy DTMI and DTMI2 binary formats.
//!
//! DTMI knows four tags: `0x01` integer (8 bytes), `0x02` string (4-byte
//! length), `0xE0`/`0xFF` object and `0x0A` array. Containers end where a
//! two-byte zero appears in place of the next key length (objects) or the
//! next value (arrays), followed by an `EE` byte.
//!
//! DTMI2 wraps one DTMI value in a 12-byte header carrying a track id and a
//! timestamp, which the decoder folds back into the value as the `trackid`
//! and `time` members.
//!
//! The decoders read from a caller-owned buffer starting at a caller-owned
//! cursor and never read past the end of the buffer. Truncated input stops
//! decoding and leaves the partially built value in place.

use log::{debug, trace, warn};

use crate::codec::BinaryCodec;
use crate::codec::primitives::{Reader, Writer};
use crate::error::DecodeError;
use crate::limits::{
    DTMI2_HEADER_LEN, DecodeOptions, END_MARKER, LEGACY_NULL_SENTINEL, MAX_KEY_LEN,
    MAX_STRING_LEN, TAG_ARRAY, TAG_INTEGER, TAG_OBJECT, TAG_OBJECT_ALT, TAG_STRING,
};
use crate::model::{Map, Value};

/// Member name DTMI2 uses for the header timestamp.
pub const TIME_KEY: &str = "time";

/// Member name DTMI2 uses for the header track id.
pub const TRACK_ID_KEY: &str = "trackid";

// =============================================================================
// DECODING
// =============================================================================

/// Consumes a container terminator if one is next: two zero bytes, then the
/// `EE` byte when the buffer still has one.
fn at_terminator(reader: &mut Reader<'_>, context: &'static str) -> Result<bool, DecodeError> {
    match reader.remaining() {
        [0, 0, ..] => {
            reader.skip(2, context)?;
            if !reader.is_empty() {
                reader.skip(1, context)?;
            }
            Ok(true)
        }
        [_, _, ..] => Ok(false),
        _ => Err(DecodeError::UnexpectedEof { context }),
    }
}

fn decode_value(
    reader: &mut Reader<'_>,
    out: &mut Value,
    depth: usize,
    options: &DecodeOptions,
) -> Result<(), DecodeError> {
    let offset = reader.position();
    let tag = reader.read_byte("tag")?;
    match tag {
        TAG_INTEGER => *out = Value::Integer(reader.read_i64("integer")?),
        TAG_STRING => *out = Value::String(reader.read_long_bytes("string")?.to_vec()),
        TAG_OBJECT | TAG_OBJECT_ALT => {
            if depth >= options.max_depth {
                return Err(DecodeError::DepthLimitExceeded { max: options.max_depth });
            }
            let members = out.ensure_object();
            members.clear();
            while !at_terminator(reader, "object")? {
                let key = String::from_utf8_lossy(reader.read_short_bytes("key")?).into_owned();
                let mut member = Value::Null;
                let result = decode_value(reader, &mut member, depth + 1, options);
                if result.is_ok() || !member.is_null() {
                    members.insert(key, member);
                }
                result?;
            }
        }
        TAG_ARRAY => {
            if depth >= options.max_depth {
                return Err(DecodeError::DepthLimitExceeded { max: options.max_depth });
            }
            let items = out.ensure_array();
            items.clear();
            while !at_terminator(reader, "array")? {
                let mut item = Value::Null;
                let result = decode_value(reader, &mut item, depth + 1, options);
                if result.is_ok() || !item.is_null() {
                    items.push_back(item);
                }
                result?;
            }
        }
        _ => {
            // Legacy readers skip a single unknown byte and carry on.
            debug!("unimplemented DTMI tag 0x{tag:02x} at offset {offset}, read as null");
            *out = Value::Null;
        }
    }
    Ok(())
}

/// Decodes one DTMI value at `*cursor`, advancing the cursor.
pub fn from_dtmi(data: &[u8], cursor: &mut usize) -> Value {
    let mut out = Value::Null;
    from_dtmi_into(data, cursor, &mut out);
    out
}

/// Decodes one DTMI value at `*cursor` into `out`, replacing its contents.
pub fn from_dtmi_into(data: &[u8], cursor: &mut usize, out: &mut Value) {
    from_dtmi_with_options(data, cursor, out, DecodeOptions::default());
}

/// [`from_dtmi_into`] with explicit decoding options.
pub fn from_dtmi_with_options(data: &[u8], cursor: &mut usize, out: &mut Value, options: DecodeOptions) {
    trace!("from_dtmi: {} bytes from offset {}", data.len(), cursor);
    out.null();
    let mut reader = Reader::at(data, *cursor);
    if let Err(err) = decode_value(&mut reader, out, 0, &options) {
        debug!("DTMI decode stopped at byte {}: {err}", reader.position());
    }
    *cursor = reader.position();
}

/// Decodes the DTMI value at the start of `data`.
pub fn from_dtmi_bytes(data: &[u8]) -> Value {
    let mut cursor = 0;
    from_dtmi(data, &mut cursor)
}

/// Decodes one DTMI2 packet at `*cursor`, advancing the cursor.
pub fn from_dtmi2(data: &[u8], cursor: &mut usize) -> Value {
    let mut out = Value::Null;
    from_dtmi2_into(data, cursor, &mut out);
    out
}

/// Decodes one DTMI2 packet at `*cursor` into `out`.
///
/// Input too short to hold the header and a tag leaves `out` Null and the
/// cursor where it was.
pub fn from_dtmi2_into(data: &[u8], cursor: &mut usize, out: &mut Value) {
    out.null();
    let mut reader = Reader::at(data, *cursor);
    if reader.remaining_len() <= DTMI2_HEADER_LEN {
        debug!("DTMI2 packet shorter than its header ({} bytes)", reader.remaining_len());
        return;
    }
    let (Ok(track_id), Ok(time)) = (reader.read_u32("trackid"), reader.read_u64("time")) else {
        return;
    };
    *cursor = reader.position();
    from_dtmi_into(data, cursor, out);
    out[TIME_KEY] = Value::Integer(time as i64);
    out[TRACK_ID_KEY] = Value::Integer(track_id as i64);
}

/// Decodes the DTMI2 packet at the start of `data`.
pub fn from_dtmi2_bytes(data: &[u8]) -> Value {
    let mut cursor = 0;
    from_dtmi2(data, &mut cursor)
}

// =============================================================================
// ENCODING
// =============================================================================

fn encode_value(writer: &mut Writer, value: &Value) {
    match value {
        Value::Null => encode_integer(writer, LEGACY_NULL_SENTINEL),
        Value::Bool(b) => encode_integer(writer, *b as i64),
        Value::Integer(i) => encode_integer(writer, *i),
        Value::Double(d) => encode_integer(writer, *d as i64),
        Value::String(bytes) => {
            let len = bytes.len().min(MAX_STRING_LEN);
            if len < bytes.len() {
                warn!("truncating {}-byte string to {MAX_STRING_LEN} bytes", bytes.len());
            }
            writer.write_byte(TAG_STRING);
            writer.write_long_bytes(&bytes[..len]);
        }
        Value::Array(items) => {
            writer.write_byte(TAG_ARRAY);
            for item in items {
                encode_value(writer, item);
            }
            writer.write_bytes(&END_MARKER);
        }
        Value::Object(members) => encode_object(writer, members, &[]),
    }
}

fn encode_integer(writer: &mut Writer, value: i64) {
    writer.write_byte(TAG_INTEGER);
    writer.write_i64(value);
}

/// Writes an object, leaving out members named in `omit`. Empty keys and
/// keys over 65535 bytes have no DTMI representation and are dropped.
fn encode_object(writer: &mut Writer, members: &Map, omit: &[&str]) {
    writer.write_byte(TAG_OBJECT);
    for (key, member) in members {
        if omit.contains(&key.as_str()) {
            continue;
        }
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            warn!("dropping object member with {}-byte key from DTMI output", key.len());
            continue;
        }
        writer.write_short_bytes(key.as_bytes());
        encode_value(writer, member);
    }
    writer.write_bytes(&END_MARKER);
}

impl Value {
    /// DTMI encoding of this value.
    ///
    /// DTMI only has integers, strings, arrays, and objects: Null becomes
    /// [`LEGACY_NULL_SENTINEL`], booleans become 0 or 1, and doubles are
    /// truncated to integers.
    pub fn to_dtmi(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        encode_value(&mut writer, self);
        writer.into_bytes()
    }

    /// DTMI2 encoding of this value.
    ///
    /// The header takes its track id and timestamp from the `trackid` and
    /// `time` members, which are then left out of the DTMI body.
    pub fn to_dtmi2(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.write_u32(self[TRACK_ID_KEY].as_int() as u32);
        writer.write_u64(self[TIME_KEY].as_int() as u64);
        match self {
            Value::Object(members) => encode_object(&mut writer, members, &[TIME_KEY, TRACK_ID_KEY]),
            other => encode_value(&mut writer, other),
        }
        writer.into_bytes()
    }
}

/// DTMI as a [`BinaryCodec`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dtmi;

impl BinaryCodec for Dtmi {
    fn encode(&self, value: &Value) -> Vec<u8> {
        value.to_dtmi()
    }

    fn decode_at(&self, data: &[u8], cursor: &mut usize) -> Value {
        from_dtmi(data, cursor)
    }
}

/// DTMI2 as a [`BinaryCodec`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dtmi2;

impl BinaryCodec for Dtmi2 {
    fn encode(&self, value: &Value) -> Vec<u8> {
        value.to_dtmi2()
    }

    fn decode_at(&self, data: &[u8], cursor: &mut usize) -> Value {
        from_dtmi2(data, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet() -> Value {
        let mut v = Value::new();
        v["datatype"] = "video".into();
        v["data"] = Value::from(&[0u8, 1, 2, 0xFF][..]);
        v["keyframe"] = 1.into();
        v["parts"].push(188.into());
        v["parts"].push(376.into());
        v
    }

    #[test]
    fn test_dtmi_roundtrip() {
        let v = packet();
        let bytes = v.to_dtmi();
        let mut cursor = 0;
        assert_eq!(from_dtmi(&bytes, &mut cursor), v);
        assert_eq!(cursor, bytes.len());
    }

    #[test]
    fn test_packed_is_readable_as_dtmi() {
        let v = packet();
        assert_eq!(v.to_dtmi(), v.to_packed());
        assert_eq!(from_dtmi_bytes(&v.to_packed()), v);
    }

    #[test]
    fn test_lossy_legacy_types() {
        let mut v = Value::new();
        v["n"] = Value::Null;
        v["b"] = true.into();
        v["d"] = 2.75.into();
        let decoded = from_dtmi_bytes(&v.to_dtmi());
        assert!(decoded["n"].is_null_or_legacy_sentinel());
        assert!(!decoded["n"].is_null());
        assert_eq!(decoded["b"], Value::from(1));
        assert_eq!(decoded["d"], Value::from(2));

        let mut stripped = decoded.clone();
        stripped.remove_null_members();
        assert!(!stripped.is_member("n"));
    }

    #[test]
    fn test_alternate_object_tag() {
        let data = [0xFF, 0x00, 0x01, b'k', 0x01, 0, 0, 0, 0, 0, 0, 0, 7, 0x00, 0x00, 0xEE];
        let v = from_dtmi_bytes(&data);
        assert_eq!(v["k"].as_int(), 7);
    }

    #[test]
    fn test_decode_into_existing_value() {
        let bytes = packet().to_dtmi();
        let mut target = Value::from("stale");
        let mut cursor = 0;
        from_dtmi_into(&bytes, &mut cursor, &mut target);
        assert_eq!(target, packet());
    }

    #[test]
    fn test_embedded_in_larger_buffer() {
        let mut buf = b"HDR!".to_vec();
        buf.extend(Value::from("abc").to_dtmi());
        buf.extend(Value::from(9).to_dtmi());
        let mut cursor = 4;
        assert_eq!(from_dtmi(&buf, &mut cursor).as_string(), "abc");
        assert_eq!(cursor, 4 + 8);
        assert_eq!(from_dtmi(&buf, &mut cursor).as_int(), 9);
        assert_eq!(cursor, buf.len());
    }

    #[test]
    fn test_truncation_never_overreads() {
        let bytes = packet().to_dtmi();
        for len in 0..bytes.len() {
            let mut cursor = 0;
            let _ = from_dtmi(&bytes[..len], &mut cursor);
            assert!(cursor <= len, "cursor {cursor} past {len}");
        }
    }

    #[test]
    fn test_truncated_keeps_prefix() {
        let bytes = packet().to_dtmi();
        // Drop the outer terminator and the last array terminator byte.
        let decoded = from_dtmi_bytes(&bytes[..bytes.len() - 4]);
        assert_eq!(decoded["datatype"].as_string(), "video");
        assert_eq!(decoded["parts"].size(), 2);
    }

    #[test]
    fn test_terminator_without_ee_at_buffer_end() {
        let data = [0x0A, 0x01, 0, 0, 0, 0, 0, 0, 0, 5, 0x00, 0x00];
        let mut cursor = 0;
        let v = from_dtmi(&data, &mut cursor);
        assert_eq!(v.size(), 1);
        assert_eq!(cursor, data.len());
    }

    #[test]
    fn test_unknown_tag_reads_as_null() {
        let data = [0x0A, 0x42, 0x01, 0, 0, 0, 0, 0, 0, 0, 3, 0x00, 0x00, 0xEE];
        let v = from_dtmi_bytes(&data);
        assert_eq!(v.size(), 2);
        assert!(v[0].is_null());
        assert_eq!(v[1].as_int(), 3);
    }

    #[test]
    fn test_dtmi2_roundtrip() {
        let mut v = packet();
        v[TIME_KEY] = 1_234_567_890_123i64.into();
        v[TRACK_ID_KEY] = 3.into();
        let bytes = v.to_dtmi2();
        assert_eq!(&bytes[..4], &[0, 0, 0, 3]);
        assert_eq!(u64::from_be_bytes(bytes[4..12].try_into().unwrap()), 1_234_567_890_123);

        let mut cursor = 0;
        let decoded = from_dtmi2(&bytes, &mut cursor);
        assert_eq!(decoded, v);
        assert_eq!(cursor, bytes.len());
        assert_eq!(Dtmi2.decode(&Dtmi2.encode(&v)), v);
    }

    #[test]
    fn test_dtmi2_short_input() {
        let mut cursor = 0;
        let v = from_dtmi2(&[0u8; 12], &mut cursor);
        assert!(v.is_null());
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_dtmi2_into_existing_value() {
        let mut v = Value::new();
        v["payload"] = "x".into();
        v[TIME_KEY] = 10.into();
        v[TRACK_ID_KEY] = 1.into();
        let bytes = v.to_dtmi2();

        let mut target = Value::from(vec![Value::from(1)]);
        let mut cursor = 0;
        from_dtmi2_into(&bytes, &mut cursor, &mut target);
        assert_eq!(target, v);
    }

    #[test]
    fn test_codec_trait() {
        let v = packet();
        assert_eq!(Dtmi.decode(&Dtmi.encode(&v)), v);
    }
}
