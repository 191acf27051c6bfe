// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::expect_used, clippy::panic)]

use tree_cbor::{Document, MapReader};

/// Routes `tracing` output through the test harness so `--nocapture` shows
/// validator and codec events. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Decodes `bytes` back into a plain wire document for shape assertions.
pub fn wire(bytes: &[u8]) -> Document {
    Document::decode(bytes).expect("canonical document")
}

/// Follows a path of map keys from the document root.
pub fn at<'a>(doc: &'a Document, path: &[&str]) -> MapReader<'a> {
    let mut map = doc.as_map().expect("root map");
    for key in path {
        map = map
            .at(key)
            .and_then(|v| v.as_map())
            .unwrap_or_else(|e| panic!("{key}: {e}"));
    }
    map
}

/// Element `index` of the `@d` array of a sequence edge map.
pub fn element<'a>(seq: &MapReader<'a>, index: usize) -> MapReader<'a> {
    seq.at("@d")
        .and_then(|d| d.as_array())
        .ok()
        .and_then(|d| d.get(index))
        .and_then(|v| v.as_map().ok())
        .unwrap_or_else(|| panic!("no element {index}"))
}
