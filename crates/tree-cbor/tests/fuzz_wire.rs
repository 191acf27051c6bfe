// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
use proptest::prelude::*;
use tree_cbor::{decode_value, encode_value, Document, MapWriter};

proptest! {
    #[test]
    fn fuzz_decode_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        // The goal is simply to ensure this does not panic.
        let _ = decode_value(&bytes);
    }

    #[test]
    fn decode_of_encode_is_identity(
        ints in prop::collection::vec(any::<i64>(), 0..16),
        name in "[a-z]{0,12}",
    ) {
        let mut map = MapWriter::new();
        map.append_string("name", &name);
        map.append_array::<()>("ints", |ar| {
            for i in &ints {
                ar.append_int(*i);
            }
            Ok(())
        }).unwrap();
        let bytes = map.encode().unwrap();

        let value = decode_value(&bytes).unwrap();
        prop_assert_eq!(encode_value(&value).unwrap(), bytes.clone());

        let doc = Document::decode(&bytes).unwrap();
        let rd = doc.as_map().unwrap();
        prop_assert_eq!(rd.at("name").unwrap().as_string().unwrap(), name.as_str());
        let back: Vec<i64> = rd
            .at("ints")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_int().unwrap())
            .collect();
        prop_assert_eq!(back, ints);
    }
}
