//! End-to-end behaviour across the model and all codecs.

use packjson::codec::{TIME_KEY, TRACK_ID_KEY, from_dtmi, from_dtmi2_bytes};
use packjson::{
    BinaryCodec, Dtmi, LEGACY_NULL_SENTINEL, Packed, Value, ValueType, decode_vector,
    encode_vector,
};

fn stream_header() -> Value {
    Value::from_text(
        r#"{
            "name": "live",
            "tracks": {
                "video": {"codec": "H264", "width": 1920, "fpks": 29970, "keys": [0, 2000, 4000]},
                "audio": {"codec": "AAC", "rate": 48000, "channels": 2}
            },
            "buffer_window": 30000
        }"#,
    )
}

#[test]
fn parse_and_index_nested_text() {
    let v = Value::from_text(r#"{"a":1,"b":[1,2,3]}"#);
    assert_eq!(v.value_type(), ValueType::Object);
    assert_eq!(v.size(), 2);
    assert_eq!(v["b"].size(), 3);
    assert_eq!(v["b"][1].as_int(), 2);
}

#[test]
fn remove_null_members_recurses_into_objects() {
    let mut v = Value::from_text(r#"{"a":null,"b":1,"c":{"d":null}}"#);
    v.remove_null_members();
    assert_eq!(v, Value::from_text(r#"{"b":1,"c":{}}"#));
}

#[test]
fn run_codec_keeps_values_past_field_max() {
    let input = [0u64, 65535, 65536, 131070];
    let encoded = encode_vector(input);
    assert!(encoded.len() >= (input.len() + 2) * 2);
    assert_eq!(decode_vector(&encoded), input);
}

#[test]
fn truncated_packed_never_reports_missing_member_as_set() {
    let mut v = Value::new();
    v["x"] = 1.into();
    let bytes = v.to_packed();
    for cut in 0..bytes.len() {
        let partial = Value::from_packed(&bytes[..cut]);
        assert!(partial.is_null() || partial.is_object());
        if let Some(x) = partial.get("x") {
            assert_eq!(x.as_int(), 1);
        }
        assert!(Value::try_from_packed(&bytes[..cut]).is_err());
    }
}

#[test]
fn header_survives_every_encoding() {
    let header = stream_header();
    assert_eq!(header["tracks"]["video"]["keys"].size(), 3);

    assert_eq!(Value::from_text(&header.to_json_string()), header);
    assert_eq!(Value::from_text(&header.to_pretty_string(0)), header);
    assert_eq!(Value::from_packed(&header.to_packed()), header);
    assert_eq!(Value::from_net_packed(&header.to_net_packed()), header);

    // Integer, string, array, and object trees are identical under DTMI.
    assert_eq!(Dtmi.decode(&Dtmi.encode(&header)), header);
}

#[test]
fn dtmi_reader_accepts_packed_output_without_extended_tags() {
    let header = stream_header();
    let mut cursor = 0;
    let bytes = Packed.encode(&header);
    assert_eq!(from_dtmi(&bytes, &mut cursor), header);
    assert_eq!(cursor, bytes.len());
}

#[test]
fn packets_decode_from_one_shared_buffer() {
    let mut buffer = Vec::new();
    let mut packets = Vec::new();
    for i in 0..3i64 {
        let mut packet = Value::new();
        packet["seq"] = i.into();
        packet["data"] = Value::from(vec![i as u8; 4]);
        buffer.extend(packet.to_dtmi());
        packets.push(packet);
    }
    let mut cursor = 0;
    for expected in &packets {
        assert_eq!(&from_dtmi(&buffer, &mut cursor), expected);
    }
    assert_eq!(cursor, buffer.len());
}

#[test]
fn dtmi2_header_becomes_members() {
    let mut packet = Value::new();
    packet[TIME_KEY] = 123_456.into();
    packet[TRACK_ID_KEY] = 3.into();
    packet["keyframe"] = 1.into();
    let decoded = from_dtmi2_bytes(&packet.to_dtmi2());
    assert_eq!(decoded[TIME_KEY].as_int(), 123_456);
    assert_eq!(decoded[TRACK_ID_KEY].as_int(), 3);
    assert_eq!(decoded["keyframe"].as_int(), 1);
}

#[test]
fn legacy_null_sentinel_is_not_null() {
    let v = Dtmi.decode(&Value::Null.to_dtmi());
    assert_eq!(v.as_int(), LEGACY_NULL_SENTINEL);
    assert!(!v.is_null());
    assert!(v.is_null_or_legacy_sentinel());
}

#[test]
fn cursor_prunes_while_walking() {
    let mut header = stream_header();
    let tracks = &mut header["tracks"];
    let mut cursor = tracks.cursor_mut();
    while cursor.is_valid() {
        if cursor.get().is_some_and(|t| t["codec"].as_str() == Some("AAC")) {
            cursor.remove();
        } else {
            cursor.advance();
        }
    }
    assert_eq!(tracks.size(), 1);
    assert!(tracks.is_member("video"));
}

#[test]
fn restricted_compare_and_assign() {
    let a = stream_header();
    let mut b = a.clone();
    b["buffer_window"] = 5000.into();
    assert!(a.compare_except(&b, &["buffer_window"]));
    assert!(!a.compare_only(&b, &["buffer_window"]));

    let mut c = Value::new();
    c["buffer_window"] = 1.into();
    c.assign_from(&b, &["buffer_window"]);
    assert_eq!(c["buffer_window"].as_int(), 1);
    assert_eq!(c["tracks"], a["tracks"]);
}
