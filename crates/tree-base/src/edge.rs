// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire keys and tags shared by the edge containers.

use tree_cbor::MapReader;

use crate::error::{Result, TreeError};

/// Edge kind tag.
pub(crate) const KEY_TAG: &str = "@T";
/// Node kind name; `null` marks an empty owning edge.
pub(crate) const KEY_KIND: &str = "@t";
/// Sequence id of the node an owning edge carries.
pub(crate) const KEY_ID: &str = "@i";
/// Element array of a sequence edge.
pub(crate) const KEY_DATA: &str = "@d";
/// Sequence id a link points at.
pub(crate) const KEY_LINK: &str = "@l";

pub(crate) const TAG_MAYBE: &str = "?";
pub(crate) const TAG_ONE: &str = "1";
pub(crate) const TAG_ANY: &str = "*";
pub(crate) const TAG_MANY: &str = "+";
pub(crate) const TAG_OPT_LINK: &str = "@";
pub(crate) const TAG_LINK: &str = "$";

/// Fails with [`TreeError::Schema`] unless the map's `@T` equals `expected`.
pub(crate) fn check_tag(map: &MapReader<'_>, expected: &str) -> Result<()> {
    let found = map.at(KEY_TAG)?.as_string()?;
    if found == expected {
        Ok(())
    } else {
        Err(TreeError::Schema(format!(
            "expected edge tag '{expected}', found '{found}'"
        )))
    }
}

pub(crate) fn seq_to_wire(seq: usize) -> Result<i64> {
    i64::try_from(seq)
        .map_err(|_| TreeError::OutOfRange(format!("sequence id {seq} does not fit the wire")))
}

pub(crate) fn wire_to_seq(raw: i64) -> Result<usize> {
    usize::try_from(raw).map_err(|_| TreeError::Schema(format!("invalid sequence id {raw}")))
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use tree_cbor::{Document, MapWriter};

    #[test]
    fn tag_mismatch_is_schema_error() {
        let mut map = MapWriter::new();
        map.append_string(KEY_TAG, TAG_ANY);
        let doc = Document::from_value(map.into_value());
        let rd = doc.as_map().expect("map");
        assert!(check_tag(&rd, TAG_ANY).is_ok());
        let err = check_tag(&rd, TAG_MANY).expect_err("mismatch");
        assert!(err.is_schema(), "{err}");
    }

    #[test]
    fn missing_tag_is_codec_error() {
        let doc = Document::from_value(MapWriter::new().into_value());
        let rd = doc.as_map().expect("map");
        assert!(matches!(check_tag(&rd, TAG_ONE), Err(TreeError::Codec(_))));
    }

    #[test]
    fn negative_sequence_id_is_rejected() {
        assert_eq!(wire_to_seq(3).ok(), Some(3));
        assert!(wire_to_seq(-1).expect_err("negative").is_schema());
        assert_eq!(seq_to_wire(5).ok(), Some(5));
    }
}
