// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoder limits, loadable from application config files.

use std::io::Read;

use serde::{Deserialize, Serialize};

/// Default maximum nesting depth accepted by the decoder.
///
/// Tree decoding recurses once per nested node, and a node can sit a single
/// map level below its parent, so this also bounds that recursion.
pub const DEFAULT_MAX_DEPTH: usize = 256;
/// Default maximum input size accepted by the decoder (64 MiB).
pub const DEFAULT_MAX_INPUT_LEN: usize = 64 * 1024 * 1024;

/// Limits applied when decoding untrusted documents.
///
/// Every field has a default, so a partial config object (or `{}`) is valid:
///
/// ```
/// let cfg: tree_cbor::CodecConfig = serde_json::from_str(r#"{"max_depth": 64}"#).unwrap();
/// assert_eq!(cfg.max_depth, 64);
/// assert_eq!(cfg.max_input_len, tree_cbor::DEFAULT_MAX_INPUT_LEN);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum nesting of arrays and maps.
    ///
    /// A tree level costs one level (an optional-one or exactly-one field) to
    /// two (an element inside a sequence field). Raising this far above the
    /// default needs a correspondingly larger thread stack.
    pub max_depth: usize,
    /// Maximum size of an encoded document in bytes.
    pub max_input_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_len: DEFAULT_MAX_INPUT_LEN,
        }
    }
}

impl CodecConfig {
    /// Reads `reader` to the end, buffering at most `max_input_len + 1` bytes.
    ///
    /// An oversized stream is cut off there rather than drained; decoding the
    /// result then fails with [`crate::CborError::InputTooLarge`].
    pub fn read_input<R: Read>(&self, reader: R) -> std::io::Result<Vec<u8>> {
        let limit = u64::try_from(self.max_input_len)
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        let mut bytes = Vec::new();
        reader.take(limit).read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{decode_value_with, CborError};

    #[test]
    fn read_input_stops_one_past_the_limit() {
        let config = CodecConfig {
            max_input_len: 4,
            ..CodecConfig::default()
        };
        let bytes = [0x85, 0x01, 0x02, 0x03, 0x04, 0x05];
        let read = config.read_input(&bytes[..]).expect("read");
        assert_eq!(read.len(), 5);
        assert_eq!(
            decode_value_with(&read, &config),
            Err(CborError::InputTooLarge { len: 5, limit: 4 })
        );
    }

    #[test]
    fn read_input_keeps_small_streams_whole() {
        let bytes = [0x83, 0x01, 0x02, 0x03];
        let read = CodecConfig::default().read_input(&bytes[..]).expect("read");
        assert_eq!(read, bytes);
    }
}
