//! Packed binary encoding of values.
//!
//! Every value starts with a one-byte tag (see [`crate::limits`]). Arrays and
//! objects list their children and close with the three-byte end marker
//! `00 00 EE`; object children are each preceded by a 2-byte length-prefixed
//! key. Integers, strings, arrays, and objects are laid out exactly as in
//! DTMI, so DTMI readers accept any packed value that has no doubles,
//! booleans, or nulls.
//!
//! The net variant prefixes the packed bytes with a 4-byte big-endian count
//! of the bytes that follow.

use std::io::{self, Write};

use log::{debug, trace, warn};

use crate::codec::BinaryCodec;
use crate::codec::primitives::{Reader, Writer};
use crate::error::DecodeError;
use crate::limits::{
    DecodeOptions, END_MARKER, MAX_KEY_LEN, MAX_STRING_LEN, NET_HEADER_LEN, TAG_ARRAY, TAG_BOOL,
    TAG_DOUBLE, TAG_INTEGER, TAG_NULL, TAG_OBJECT, TAG_OBJECT_ALT, TAG_STRING,
};
use crate::model::Value;

// =============================================================================
// ENCODING
// =============================================================================

/// String payload as it will be written, truncated to what a 4-byte length
/// prefix can describe.
fn encodable_string(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len().min(MAX_STRING_LEN)]
}

fn encodable_key(key: &str) -> bool {
    key.len() <= MAX_KEY_LEN
}

fn encode_value(writer: &mut Writer, value: &Value) {
    match value {
        Value::Null => writer.write_byte(TAG_NULL),
        Value::Bool(b) => {
            writer.write_byte(TAG_BOOL);
            writer.write_byte(*b as u8);
        }
        Value::Integer(i) => {
            writer.write_byte(TAG_INTEGER);
            writer.write_i64(*i);
        }
        Value::Double(d) => {
            writer.write_byte(TAG_DOUBLE);
            writer.write_f64(*d);
        }
        Value::String(bytes) => {
            if bytes.len() > MAX_STRING_LEN {
                warn!("truncating {}-byte string to {MAX_STRING_LEN} bytes", bytes.len());
            }
            writer.write_byte(TAG_STRING);
            writer.write_long_bytes(encodable_string(bytes));
        }
        Value::Array(items) => {
            writer.write_byte(TAG_ARRAY);
            for item in items {
                encode_value(writer, item);
            }
            writer.write_bytes(&END_MARKER);
        }
        Value::Object(members) => {
            writer.write_byte(TAG_OBJECT);
            for (key, member) in members {
                if !encodable_key(key) {
                    warn!("skipping object member with {}-byte key", key.len());
                    continue;
                }
                writer.write_short_bytes(key.as_bytes());
                encode_value(writer, member);
            }
            writer.write_bytes(&END_MARKER);
        }
    }
}

fn encoded_size(value: &Value) -> usize {
    match value {
        Value::Null => 1,
        Value::Bool(_) => 2,
        Value::Integer(_) | Value::Double(_) => 9,
        Value::String(bytes) => 5 + encodable_string(bytes).len(),
        Value::Array(items) => 1 + items.iter().map(encoded_size).sum::<usize>() + END_MARKER.len(),
        Value::Object(members) => {
            1 + members
                .iter()
                .filter(|(key, _)| encodable_key(key))
                .map(|(key, member)| 2 + key.len() + encoded_size(member))
                .sum::<usize>()
                + END_MARKER.len()
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Consumes the end marker if it is next. Errors if the input stops partway
/// through one.
fn at_end_marker(reader: &mut Reader<'_>, context: &'static str) -> Result<bool, DecodeError> {
    if reader.starts_with(&END_MARKER) {
        reader.skip(END_MARKER.len(), context)?;
        return Ok(true);
    }
    let rest = reader.remaining();
    if rest.len() < END_MARKER.len() && END_MARKER.starts_with(rest) {
        return Err(DecodeError::UnexpectedEof { context });
    }
    Ok(false)
}

/// Decodes one value into `out`.
///
/// On error `out` holds everything decoded before the failure.
fn decode_value(
    reader: &mut Reader<'_>,
    out: &mut Value,
    depth: usize,
    options: &DecodeOptions,
) -> Result<(), DecodeError> {
    let offset = reader.position();
    let tag = reader.read_byte("tag")?;
    match tag {
        TAG_NULL => *out = Value::Null,
        TAG_BOOL => *out = Value::Bool(reader.read_byte("bool")? != 0),
        TAG_INTEGER => *out = Value::Integer(reader.read_i64("integer")?),
        TAG_DOUBLE => *out = Value::Double(reader.read_f64("double")?),
        TAG_STRING => *out = Value::String(reader.read_long_bytes("string")?.to_vec()),
        TAG_ARRAY => {
            if depth >= options.max_depth {
                return Err(DecodeError::DepthLimitExceeded { max: options.max_depth });
            }
            let items = out.ensure_array();
            items.clear();
            while !at_end_marker(reader, "array")? {
                let mut item = Value::Null;
                let result = decode_value(reader, &mut item, depth + 1, options);
                if result.is_ok() || !item.is_null() {
                    items.push_back(item);
                }
                result?;
            }
        }
        TAG_OBJECT | TAG_OBJECT_ALT => {
            if depth >= options.max_depth {
                return Err(DecodeError::DepthLimitExceeded { max: options.max_depth });
            }
            let members = out.ensure_object();
            members.clear();
            while !at_end_marker(reader, "object")? {
                let key = String::from_utf8_lossy(reader.read_short_bytes("key")?).into_owned();
                let mut member = Value::Null;
                let result = decode_value(reader, &mut member, depth + 1, options);
                if result.is_ok() || !member.is_null() {
                    members.insert(key, member);
                }
                result?;
            }
        }
        _ => return Err(DecodeError::InvalidTag { tag, offset }),
    }
    Ok(())
}

fn decode_lenient(data: &[u8], cursor: &mut usize, options: &DecodeOptions) -> Value {
    let mut reader = Reader::at(data, *cursor);
    let mut out = Value::Null;
    if let Err(err) = decode_value(&mut reader, &mut out, 0, options) {
        debug!("packed decode stopped at byte {}: {err}", reader.position());
    }
    *cursor = reader.position();
    out
}

// =============================================================================
// NET FRAMING
// =============================================================================

/// A packed value behind its 4-byte length header, ready for a transport
/// that does not delimit messages itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetFrame {
    bytes: Vec<u8>,
}

impl NetFrame {
    /// Header and payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The packed payload without the header.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[NET_HEADER_LEN..]
    }

    /// Total frame length, header included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for NetFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl Value {
    /// Appends the packed encoding of this value to `writer`.
    pub fn write_packed(&self, writer: &mut Writer) {
        encode_value(writer, self);
    }

    /// Packed encoding of this value.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut writer = Writer::with_capacity(self.packed_size());
        encode_value(&mut writer, self);
        writer.into_bytes()
    }

    /// Exact length of [`Value::to_packed`], computed without encoding.
    pub fn packed_size(&self) -> usize {
        encoded_size(self)
    }

    /// Decodes a packed value.
    ///
    /// Never fails: truncated or malformed input yields whatever was decoded
    /// before the problem (possibly Null). Use [`Value::try_from_packed`] to
    /// detect that.
    pub fn from_packed(data: &[u8]) -> Value {
        let mut cursor = 0;
        Self::from_packed_at(data, &mut cursor)
    }

    /// Decodes a packed value starting at `*cursor`, advancing the cursor
    /// past the bytes consumed.
    pub fn from_packed_at(data: &[u8], cursor: &mut usize) -> Value {
        trace!("from_packed_at: {} bytes from offset {}", data.len(), cursor);
        decode_lenient(data, cursor, &DecodeOptions::default())
    }

    /// [`Value::from_packed_at`] with explicit decoding options.
    pub fn from_packed_with_options(data: &[u8], cursor: &mut usize, options: DecodeOptions) -> Value {
        decode_lenient(data, cursor, &options)
    }

    /// Strictly decodes exactly one packed value spanning all of `data`.
    pub fn try_from_packed(data: &[u8]) -> Result<Value, DecodeError> {
        Self::try_from_packed_with_options(data, DecodeOptions::default())
    }

    /// [`Value::try_from_packed`] with explicit decoding options.
    pub fn try_from_packed_with_options(data: &[u8], options: DecodeOptions) -> Result<Value, DecodeError> {
        let mut reader = Reader::new(data);
        let mut out = Value::Null;
        decode_value(&mut reader, &mut out, 0, &options)?;
        if !reader.is_empty() {
            return Err(DecodeError::TrailingBytes {
                remaining: reader.remaining_len(),
            });
        }
        Ok(out)
    }

    /// Packs this value behind a 4-byte big-endian length header.
    pub fn net_prepare(&self) -> NetFrame {
        let size = self.packed_size();
        let declared = u32::try_from(size).unwrap_or_else(|_| {
            warn!("packed size {size} does not fit the net header");
            u32::MAX
        });
        let mut writer = Writer::with_capacity(NET_HEADER_LEN + size);
        writer.write_u32(declared);
        encode_value(&mut writer, self);
        NetFrame {
            bytes: writer.into_bytes(),
        }
    }

    /// Header and payload bytes of [`Value::net_prepare`].
    pub fn to_net_packed(&self) -> Vec<u8> {
        self.net_prepare().into_bytes()
    }

    /// Hands the net-framed encoding to a connection.
    pub fn send_to<W: Write + ?Sized>(&self, connection: &mut W) -> io::Result<()> {
        connection.write_all(self.net_prepare().as_bytes())
    }

    /// Decodes a net frame. Never fails; a short or inconsistent frame
    /// yields what could be decoded from the bytes present.
    pub fn from_net_packed(data: &[u8]) -> Value {
        let mut reader = Reader::new(data);
        let Ok(declared) = reader.read_u32("net header") else {
            debug!("net frame shorter than its header ({} bytes)", data.len());
            return Value::Null;
        };
        let end = data.len().min(NET_HEADER_LEN.saturating_add(declared as usize));
        Self::from_packed(&data[NET_HEADER_LEN..end])
    }

    /// Strictly decodes a net frame whose header matches its payload length.
    pub fn try_from_net_packed(data: &[u8]) -> Result<Value, DecodeError> {
        let mut reader = Reader::new(data);
        let declared = reader.read_u32("net header")? as usize;
        let actual = reader.remaining_len();
        if declared != actual {
            return Err(DecodeError::FrameLengthMismatch { declared, actual });
        }
        Self::try_from_packed(reader.remaining())
    }
}

/// The packed format as a [`BinaryCodec`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Packed;

impl BinaryCodec for Packed {
    fn encode(&self, value: &Value) -> Vec<u8> {
        value.to_packed()
    }

    fn decode_at(&self, data: &[u8], cursor: &mut usize) -> Value {
        Value::from_packed_at(data, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut v = Value::new();
        v["int"] = (-5).into();
        v["dbl"] = 2.5.into();
        v["str"] = "hi".into();
        v["bin"] = Value::from(&[0u8, 0xFF, 0x00][..]);
        v["flag"] = true.into();
        v["none"] = Value::Null;
        v["list"].push(1.into());
        v["list"].push(Value::object());
        v["list"].push(Value::array());
        v[""] = "empty key".into();
        v
    }

    #[test]
    fn test_roundtrip_and_size() {
        let v = sample();
        let packed = v.to_packed();
        assert_eq!(packed.len(), v.packed_size());
        assert_eq!(Value::from_packed(&packed), v);
        assert_eq!(Value::try_from_packed(&packed), Ok(v));
    }

    #[test]
    fn test_layout() {
        let mut v = Value::new();
        v["x"] = 1.into();
        assert_eq!(
            v.to_packed(),
            vec![
                0xE0, 0x00, 0x01, b'x', 0x01, 0, 0, 0, 0, 0, 0, 0, 1, 0x00, 0x00, 0xEE
            ]
        );
        assert_eq!(Value::from("ab").to_packed(), vec![0x02, 0, 0, 0, 2, b'a', b'b']);
        assert_eq!(Value::Null.to_packed(), vec![0x04]);
        assert_eq!(Value::from(false).to_packed(), vec![0x05, 0x00]);
    }

    #[test]
    fn test_truncated_object_keeps_members() {
        let mut v = Value::new();
        v["x"] = 1.into();
        let mut packed = v.to_packed();
        packed.pop();

        let mut cursor = 0;
        let decoded = Value::from_packed_at(&packed, &mut cursor);
        assert!(decoded.is_object());
        assert_eq!(decoded["x"], Value::from(1));
        assert!(cursor <= packed.len());
        assert!(matches!(
            Value::try_from_packed(&packed),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_every_truncation_is_safe() {
        let packed = sample().to_packed();
        for len in 0..packed.len() {
            let mut cursor = 0;
            let _ = Value::from_packed_at(&packed[..len], &mut cursor);
            assert!(cursor <= len);
            assert!(Value::try_from_packed(&packed[..len]).is_err());
        }
    }

    #[test]
    fn test_truncated_nested_keeps_partial_child() {
        let mut v = Value::new();
        v["a"]["b"] = 1.into();
        v["a"]["c"] = "long string".into();
        let packed = v.to_packed();
        // Cut inside the "c" string payload.
        let decoded = Value::from_packed(&packed[..packed.len() - 10]);
        assert_eq!(decoded["a"]["b"].as_int(), 1);
        assert!(!decoded["a"].is_member("c"));
    }

    #[test]
    fn test_invalid_tag() {
        assert_eq!(
            Value::try_from_packed(&[0x7F]),
            Err(DecodeError::InvalidTag { tag: 0x7F, offset: 0 })
        );
        assert!(Value::from_packed(&[0x7F]).is_null());
    }

    #[test]
    fn test_trailing_bytes() {
        let mut packed = Value::from(1).to_packed();
        packed.push(0);
        assert_eq!(
            Value::try_from_packed(&packed),
            Err(DecodeError::TrailingBytes { remaining: 1 })
        );
        let mut cursor = 0;
        assert_eq!(Value::from_packed_at(&packed, &mut cursor), Value::from(1));
        assert_eq!(cursor, 9);
    }

    #[test]
    fn test_consecutive_values_with_cursor() {
        let mut buf = Value::from("one").to_packed();
        buf.extend(Value::from(2).to_packed());
        let mut cursor = 0;
        assert_eq!(Value::from_packed_at(&buf, &mut cursor).as_string(), "one");
        assert_eq!(Value::from_packed_at(&buf, &mut cursor).as_int(), 2);
        assert_eq!(cursor, buf.len());
    }

    #[test]
    fn test_depth_limit() {
        let mut v = Value::new();
        v[0][0][0] = 1.into();
        let packed = v.to_packed();
        let options = DecodeOptions::new().with_max_depth(2);
        assert_eq!(
            Value::try_from_packed_with_options(&packed, options),
            Err(DecodeError::DepthLimitExceeded { max: 2 })
        );
        assert!(Value::try_from_packed_with_options(&packed, DecodeOptions::new().with_max_depth(3)).is_ok());
    }

    #[test]
    fn test_hostile_nesting_does_not_overflow() {
        let data = vec![TAG_ARRAY; 100_000];
        let result = Value::try_from_packed(&data);
        assert!(matches!(result, Err(DecodeError::DepthLimitExceeded { .. })));
    }

    #[test]
    fn test_net_frame() {
        let v = sample();
        let frame = v.net_prepare();
        let declared = u32::from_be_bytes(frame.as_bytes()[..4].try_into().unwrap());
        assert_eq!(declared as usize, v.packed_size());
        assert_eq!(frame.payload(), v.to_packed().as_slice());
        assert_eq!(Value::try_from_net_packed(frame.as_bytes()), Ok(v.clone()));
        assert_eq!(Value::from_net_packed(&v.to_net_packed()), v);
    }

    #[test]
    fn test_net_frame_length_mismatch() {
        let mut bytes = Value::from(1).to_net_packed();
        bytes.push(0);
        assert_eq!(
            Value::try_from_net_packed(&bytes),
            Err(DecodeError::FrameLengthMismatch { declared: 9, actual: 10 })
        );
        assert_eq!(Value::from_net_packed(&bytes), Value::from(1));
        assert!(Value::from_net_packed(&[0, 0]).is_null());
    }

    #[test]
    fn test_send_to_writes_frame() {
        let v = sample();
        let mut connection: Vec<u8> = Vec::new();
        v.send_to(&mut connection).unwrap();
        assert_eq!(connection, v.to_net_packed());
    }

    #[test]
    fn test_codec_trait() {
        let v = sample();
        let bytes = Packed.encode(&v);
        assert_eq!(Packed.decode(&bytes), v);
    }
}
