/// Property-based round-trip tests.
///
/// Generates random value trees and checks that every encoding reads back
/// what it wrote, that `packed_size` predicts the encoded length, and that
/// decoding arbitrary bytes neither panics nor over-reads.
///
/// Doubles are drawn from finite values only; non-finite doubles render as
/// `null` in JSON text. Strings include arbitrary bytes, which must survive
/// text unchanged.
use proptest::prelude::*;
use packjson::{Value, decode_vector, decode_vector4, encode_vector, encode_vector4};

// ============================================================================
// Strategies
// ============================================================================

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,12}",
        Just(String::new()),
        Just("caf\u{00e9}".to_string()),
        Just("with \"quotes\"".to_string()),
    ]
}

fn arb_string() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,24}".prop_map(Value::from),
        Just(Value::from("line1\nline2\ttab")),
        Just(Value::from("\u{4f60}\u{597d} \u{1F600}")),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::from),
    ]
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop::num::f64::NORMAL.prop_map(Value::from),
        Just(Value::from(0.0)),
        arb_string(),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::btree_map(arb_key(), inner, 0..6).prop_map(Value::from),
        ]
    })
}

/// Trees DTMI can carry unchanged: integers, strings, arrays, and objects
/// with non-empty keys.
fn arb_dtmi_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6).prop_map(Value::from),
        ]
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn text_roundtrip(v in arb_value()) {
        let text = v.to_json_string();
        prop_assert_eq!(Value::try_from_text(&text).unwrap(), v.clone());
        prop_assert_eq!(Value::try_from_text(&v.to_pretty_string(0)).unwrap(), v);
    }

    #[test]
    fn packed_roundtrip(v in arb_value()) {
        let bytes = v.to_packed();
        prop_assert_eq!(bytes.len(), v.packed_size());
        prop_assert_eq!(Value::try_from_packed(&bytes).unwrap(), v.clone());
        prop_assert_eq!(Value::try_from_net_packed(&v.to_net_packed()).unwrap(), v);
    }

    #[test]
    fn dtmi_roundtrip(v in arb_dtmi_value()) {
        let mut cursor = 0;
        let bytes = v.to_dtmi();
        prop_assert_eq!(packjson::codec::from_dtmi(&bytes, &mut cursor), v);
        prop_assert_eq!(cursor, bytes.len());
    }

    #[test]
    fn decoders_tolerate_garbage(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = Value::from_packed(&bytes);
        let _ = Value::from_net_packed(&bytes);
        let _ = Value::from_text_bytes(&bytes);
        let mut cursor = 0;
        let _ = packjson::codec::from_dtmi(&bytes, &mut cursor);
        prop_assert!(cursor <= bytes.len());
        let _ = decode_vector(&bytes);
        let _ = decode_vector4(&bytes);
    }

    #[test]
    fn truncated_packed_is_rejected(v in arb_value(), cut in any::<prop::sample::Index>()) {
        let bytes = v.to_packed();
        let len = cut.index(bytes.len());
        prop_assert!(Value::try_from_packed(&bytes[..len]).is_err());
        let _ = Value::from_packed(&bytes[..len]);
    }

    #[test]
    fn run_codecs_roundtrip(values in prop::collection::vec(
        prop_oneof![0u64..300_000, Just(0xFFFF), Just(0x1_0000)],
        0..20,
    )) {
        prop_assert_eq!(decode_vector(&encode_vector(values.iter().copied())), values.clone());
        prop_assert_eq!(decode_vector4(&encode_vector4(values.iter().copied())), values);
    }

    #[test]
    fn wide_run_codec_roundtrip(values in prop::collection::vec(
        prop_oneof![any::<u32>().prop_map(u64::from), Just(0xFFFF_FFFF), Just(0x3_0000_0000)],
        0..20,
    )) {
        prop_assert_eq!(decode_vector4(&encode_vector4(values.iter().copied())), values);
    }

    #[test]
    fn clone_is_independent(v in arb_value(), key in arb_key()) {
        let original = v.clone();
        let mut copy = v.clone();
        copy[key.as_str()] = Value::from("changed");
        copy.push(Value::Null);
        prop_assert_eq!(v, original);
    }

    #[test]
    fn object_iteration_is_sorted(
        members in prop::collection::btree_map(arb_key(), any::<i64>(), 0..12),
    ) {
        let mut v = Value::new();
        for (k, n) in members.iter().rev() {
            v[k.as_str()] = (*n).into();
        }
        let keys: Vec<&str> = v.cursor().filter_map(|e| e.key).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        prop_assert_eq!(keys.len(), members.len());
        prop_assert_eq!(keys, sorted);
    }
}
