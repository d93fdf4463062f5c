// tests/property_test.rs

//! Property-based tests for the RESP codec: any frame the encoder can produce
//! decodes back to an equal frame, consuming exactly the encoded bytes.

use bytes::Bytes;
use citrinedb::core::protocol::{RespFrame, parse_frame};
use proptest::prelude::*;

/// Text safe for line-terminated frame types (no CR/LF).
fn line_text() -> impl Strategy<Value = String> {
    // Printable ASCII: line-terminated frames cannot contain CR or LF.
    "[ -~]{0,64}".prop_map(|s| s)
}

/// Bulk payloads must be valid UTF-8 to round-trip as `BulkString`; binary
/// payloads travel as `RawBytes`.
fn utf8_payload() -> impl Strategy<Value = Bytes> {
    ".{0,128}".prop_map(Bytes::from)
}

/// Payloads guaranteed not to be valid UTF-8 (0xFF never appears in UTF-8).
fn binary_payload() -> impl Strategy<Value = Bytes> {
    proptest::collection::vec(any::<u8>(), 0..128).prop_map(|mut v| {
        v.insert(0, 0xFF);
        Bytes::from(v)
    })
}

fn leaf_frame() -> impl Strategy<Value = RespFrame> {
    prop_oneof![
        line_text().prop_map(RespFrame::SimpleString),
        line_text().prop_map(RespFrame::Error),
        any::<i64>().prop_map(RespFrame::Integer),
        utf8_payload().prop_map(RespFrame::BulkString),
        Just(RespFrame::Null),
        Just(RespFrame::NullArray),
    ]
}

fn frame_strategy() -> impl Strategy<Value = RespFrame> {
    leaf_frame().prop_recursive(3, 48, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(RespFrame::Array),
            proptest::collection::vec(("[a-z]{1,10}", inner), 0..4)
                .prop_map(RespFrame::Map),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_codec_round_trip(frame in frame_strategy()) {
        let encoded = frame.encode_to_vec().unwrap();
        let (decoded, consumed) = parse_frame(&encoded).unwrap();
        prop_assert_eq!(consumed, encoded.len());
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn test_raw_bytes_round_trip(payload in binary_payload()) {
        let frame = RespFrame::RawBytes(payload);
        let encoded = frame.encode_to_vec().unwrap();
        let (decoded, consumed) = parse_frame(&encoded).unwrap();
        prop_assert_eq!(consumed, encoded.len());
        prop_assert_eq!(decoded, frame);
    }

    #[test]
    fn test_double_round_trip(value in proptest::num::f64::NORMAL) {
        let encoded = RespFrame::Double(value).encode_to_vec().unwrap();
        let (decoded, _) = parse_frame(&encoded).unwrap();
        prop_assert_eq!(decoded, RespFrame::Double(value));
    }
}
