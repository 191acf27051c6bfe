// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type shared by the canonical codec and the map readers.

use thiserror::Error;

/// Errors produced while encoding, decoding, or reading a wire document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CborError {
    /// Input ended in the middle of a value.
    #[error("incomplete input")]
    Incomplete,
    /// Bytes remained after the top-level value.
    #[error("trailing bytes after value")]
    Trailing,
    /// CBOR tags are not part of the wire model.
    #[error("tags not allowed")]
    Tag,
    /// Indefinite-length items are not part of the wire model.
    #[error("indefinite length not allowed")]
    Indefinite,
    /// Integer or length encoded wider than necessary.
    #[error("non-canonical integer width")]
    NonCanonicalInt,
    /// Float encoded wider than necessary.
    #[error("non-canonical float width")]
    NonCanonicalFloat,
    /// Float carries an integral value and must be encoded as an integer.
    #[error("float encodes integral value; must be integer")]
    FloatShouldBeInt,
    /// Map keys are not in canonical (bytewise) order.
    #[error("map keys not strictly increasing")]
    MapKeyOrder,
    /// Map contains the same key twice.
    #[error("duplicate map key")]
    MapKeyDuplicate,
    /// Nesting exceeded the configured maximum depth.
    #[error("nesting depth exceeds limit of {limit}")]
    DepthExceeded {
        /// Configured depth limit.
        limit: usize,
    },
    /// Input exceeded the configured maximum size.
    #[error("input of {len} bytes exceeds limit of {limit}")]
    InputTooLarge {
        /// Actual input length.
        len: usize,
        /// Configured byte limit.
        limit: usize,
    },
    /// A required map key is absent.
    #[error("key not found: {0}")]
    KeyNotFound(String),
    /// A value had a different type than the reader asked for.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the reader asked for.
        expected: &'static str,
        /// Type actually present.
        found: &'static str,
    },
    /// Any other malformed input.
    #[error("decode error: {0}")]
    Decode(String),
}
