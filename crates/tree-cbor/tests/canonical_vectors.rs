// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Golden vectors and rejection cases for the canonical wire encoding.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use tree_cbor::{decode_value, CborError, Document, MapWriter};

#[test]
fn golden_empty_maybe_edge() {
    let mut map = MapWriter::new();
    map.append_string("@T", "?");
    map.append_null("@t");
    let bytes = map.encode().expect("encode");
    // { "@T": "?", "@t": null }: keys sort bytewise, "@T" (0x54) before "@t" (0x74).
    let expected: &[u8] = &[0xa2, 0x62, 0x40, 0x54, 0x61, 0x3f, 0x62, 0x40, 0x74, 0xf6];
    assert_eq!(bytes, expected);
}

#[test]
fn golden_link_edge() {
    let mut map = MapWriter::new();
    map.append_string("@T", "$");
    map.append_int("@l", 0);
    let bytes = map.encode().expect("encode");
    let expected: &[u8] = &[0xa2, 0x62, 0x40, 0x54, 0x61, 0x24, 0x62, 0x40, 0x6c, 0x00];
    assert_eq!(bytes, expected);

    let doc = Document::decode(&bytes).expect("decode");
    let map = doc.as_map().expect("map");
    assert_eq!(map.at("@T").and_then(|v| v.as_string()), Ok("$"));
    assert_eq!(map.at("@l").and_then(|v| v.as_int()), Ok(0));
}

#[test]
fn insertion_order_does_not_change_bytes() {
    let mut a = MapWriter::new();
    a.append_int("@i", 3);
    a.append_string("@T", "1");
    let mut b = MapWriter::new();
    b.append_string("@T", "1");
    b.append_int("@i", 3);
    assert_eq!(a.encode(), b.encode());
}

#[test]
fn reject_non_canonical_int_width() {
    // { "x": 1 } with 1 encoded as 0x18 0x01.
    let bytes: &[u8] = &[0xa1, 0x61, 0x78, 0x18, 0x01];
    assert_eq!(decode_value(bytes), Err(CborError::NonCanonicalInt));
}

#[test]
fn reject_map_key_order() {
    // { "b": 1, "a": 2 }
    let bytes: &[u8] = &[0xa2, 0x61, 0x62, 0x01, 0x61, 0x61, 0x02];
    assert_eq!(decode_value(bytes), Err(CborError::MapKeyOrder));
}

#[test]
fn reject_duplicate_map_key() {
    // { "a": 1, "a": 2 }
    let bytes: &[u8] = &[0xa2, 0x61, 0x61, 0x01, 0x61, 0x61, 0x02];
    assert_eq!(decode_value(bytes), Err(CborError::MapKeyDuplicate));
}

#[test]
fn reject_tags_indefinite_and_trailing() {
    assert_eq!(decode_value(&[0xc1, 0x00]), Err(CborError::Tag));
    assert_eq!(decode_value(&[0x9f, 0xff]), Err(CborError::Indefinite));
    assert_eq!(decode_value(&[0x00, 0x00]), Err(CborError::Trailing));
    assert_eq!(decode_value(&[0x62, 0x40]), Err(CborError::Incomplete));
}

#[test]
fn reject_non_canonical_floats() {
    // 1.0 as f32 must be the integer 1.
    assert_eq!(
        decode_value(&[0xfa, 0x3f, 0x80, 0x00, 0x00]),
        Err(CborError::FloatShouldBeInt)
    );
    // 1.5 as f64 fits in f16.
    assert_eq!(
        decode_value(&[0xfb, 0x3f, 0xf8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
        Err(CborError::NonCanonicalFloat)
    );
    // 1.5 as f32 fits in f16.
    assert_eq!(
        decode_value(&[0xfa, 0x3f, 0xc0, 0x00, 0x00]),
        Err(CborError::NonCanonicalFloat)
    );
    // 1.5 as f16 is canonical.
    assert!(decode_value(&[0xf9, 0x3e, 0x00]).is_ok());
}
