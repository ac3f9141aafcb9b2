//! Codec Tests
//!
//! Canonical encoding of each supported kind and the typed bridge.

use atlasmap::codec::{decode, decode_as, encode, encode_as, Kind, Record, Storable, Value};
use atlasmap::MapError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ValueModel {
    x: i64,
    y: f64,
    s: String,
}

impl Record for ValueModel {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct KeyModel {
    data: String,
    ind: i64,
}

impl Record for KeyModel {}

#[derive(Debug, Serialize, Deserialize)]
struct Nested {
    inner: KeyModel,
}

impl Record for Nested {}

#[derive(Debug, Serialize, Deserialize)]
struct Label(String);

impl Record for Label {}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip_each_kind() {
    assert_eq!(decode_as::<i64>(encode_as(&3i64).unwrap()).unwrap(), 3);
    assert_eq!(decode_as::<f64>(encode_as(&1.3f64).unwrap()).unwrap(), 1.3);
    assert_eq!(
        decode_as::<String>(encode_as(&"lol".to_string()).unwrap()).unwrap(),
        "lol"
    );
    assert_eq!(
        decode_as::<Vec<u8>>(encode_as(&b"kek".to_vec()).unwrap()).unwrap(),
        b"kek"
    );
}

#[test]
fn test_round_trip_record() {
    let model = ValueModel {
        x: 1,
        y: 1.3,
        s: "kek".to_string(),
    };
    let decoded: ValueModel = decode_as(encode_as(&model).unwrap()).unwrap();
    assert_eq!(decoded, model);
}

#[test]
fn test_round_trip_float_edge_values() {
    for float in [0.0, -0.0, f64::MIN_POSITIVE, f64::MAX, f64::INFINITY, 0.1 + 0.2] {
        let decoded: f64 = decode_as(encode_as(&float).unwrap()).unwrap();
        assert_eq!(decoded.to_bits(), float.to_bits());
    }
    let nan: f64 = decode_as(encode_as(&f64::NAN).unwrap()).unwrap();
    assert!(nan.is_nan());
}

#[test]
fn test_round_trip_integer_extremes() {
    for int in [i64::MIN, -1, 0, 1, i64::MAX] {
        assert_eq!(decode_as::<i64>(encode_as(&int).unwrap()).unwrap(), int);
    }
}

// =============================================================================
// Canonical Form Tests
// =============================================================================

#[test]
fn test_negative_integer_text() {
    assert_eq!(encode(Value::Int(-17)).unwrap(), Bytes::from_static(b"-17"));
}

#[test]
fn test_text_is_utf8() {
    let encoded = encode(Value::Text("héllo".to_string())).unwrap();
    assert_eq!(&encoded[..], "héllo".as_bytes());
}

#[test]
fn test_float_width() {
    assert_eq!(encode(Value::Float(1.3)).unwrap().len(), 8);
}

#[test]
fn test_record_is_deterministic() {
    let a = KeyModel {
        data: "kek".to_string(),
        ind: 1,
    };
    let first = encode_as(&a).unwrap();
    let second = encode_as(&a.clone()).unwrap();
    assert_eq!(first, second);
    assert_eq!(&first[..], br#"{"data":"kek","ind":1}"#);
}

#[test]
fn test_record_takes_precedence_over_fields() {
    assert_eq!(KeyModel::KIND, Kind::Record);
    let value = KeyModel {
        data: "x".to_string(),
        ind: 2,
    }
    .to_value()
    .unwrap();
    assert_eq!(value.kind(), Kind::Record);
}

// =============================================================================
// Encode Error Tests
// =============================================================================

#[test]
fn test_nested_record_is_encode_error() {
    let nested = Nested {
        inner: KeyModel {
            data: "x".to_string(),
            ind: 1,
        },
    };
    assert!(matches!(encode_as(&nested), Err(MapError::Encode(_))));
}

#[test]
fn test_non_object_record_is_encode_error() {
    let label = Label("plain".to_string());
    assert!(matches!(encode_as(&label), Err(MapError::Encode(_))));
}

#[test]
fn test_unsigned_overflow_is_encode_error() {
    assert!(matches!(encode_as(&u64::MAX), Err(MapError::Encode(_))));
    assert_eq!(encode_as(&(i64::MAX as u64)).unwrap(), i64::MAX.to_string());
}

// =============================================================================
// Decode Error Tests
// =============================================================================

#[test]
fn test_malformed_integer() {
    let inputs: [&[u8]; 4] = [b"", b"1.5", b"abc", b"99999999999999999999"];
    for bad in inputs {
        let result = decode(Bytes::copy_from_slice(bad), Kind::Int);
        assert!(matches!(result, Err(MapError::Decode(_))), "{:?}", bad);
    }
}

#[test]
fn test_float_requires_eight_bytes() {
    for len in [0usize, 4, 7, 9, 16] {
        let result = decode(Bytes::from(vec![0u8; len]), Kind::Float);
        assert!(matches!(result, Err(MapError::Decode(_))), "len {}", len);
    }
}

#[test]
fn test_record_schema_mismatch() {
    // Missing field
    let missing = decode_as::<ValueModel>(Bytes::from_static(br#"{"x":1,"s":"kek"}"#));
    assert!(matches!(missing, Err(MapError::Decode(_))));

    // Mistyped field
    let mistyped =
        decode_as::<ValueModel>(Bytes::from_static(br#"{"x":"one","y":1.0,"s":"kek"}"#));
    assert!(matches!(mistyped, Err(MapError::Decode(_))));
}

#[test]
fn test_record_from_garbage() {
    let result = decode(Bytes::from_static(b"not json"), Kind::Record);
    assert!(matches!(result, Err(MapError::Decode(_))));
}

#[test]
fn test_narrowing_integer_decode() {
    let encoded = encode_as(&70_000i64).unwrap();
    assert!(matches!(decode_as::<u16>(encoded.clone()), Err(MapError::Decode(_))));
    assert_eq!(decode_as::<u32>(encoded).unwrap(), 70_000);
}

#[test]
fn test_untagged_bytes_are_shared_between_int_and_text() {
    // No type tag: integer 12 and text "12" are the same bytes
    let from_int = encode_as(&12i64).unwrap();
    let from_text = encode_as(&"12".to_string()).unwrap();
    assert_eq!(from_int, from_text);
}
