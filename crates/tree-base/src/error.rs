// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error kinds raised by edges, the validator, and the (de)serializer.

use thiserror::Error;
use tree_cbor::CborError;

/// Every failure the tree runtime can report.
///
/// None of these are transient; callers match on the variant to tell corrupt
/// input ([`TreeError::Schema`], [`TreeError::Codec`]) from structural
/// problems ([`TreeError::NotWellFormed`]) and call-site mistakes
/// ([`TreeError::OutOfRange`]).
#[derive(Debug, Error)]
pub enum TreeError {
    /// The encoded edge tag or node kind did not match what the decoder expected.
    #[error("schema validation failed: {0}")]
    Schema(String),
    /// Duplicate ownership, a dangling or foreign link, or an empty mandatory edge.
    #[error("not well-formed: {0}")]
    NotWellFormed(String),
    /// Dereferencing an empty or expired edge, or indexing past the end of a sequence.
    #[error("out of range: {0}")]
    OutOfRange(String),
    /// The wire document was malformed or had unexpected value types.
    #[error("codec error: {0}")]
    Codec(#[from] CborError),
    /// Reading or writing a stream or file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TreeError {
    /// Returns whether this is a [`TreeError::Schema`] error.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Returns whether this is a [`TreeError::NotWellFormed`] error.
    pub fn is_not_well_formed(&self) -> bool {
        matches!(self, Self::NotWellFormed(_))
    }

    /// Returns whether this is a [`TreeError::OutOfRange`] error.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = TreeError> = std::result::Result<T, E>;
