// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire model for tree-base documents.
//!
//! A document is a tree of CBOR maps, arrays, integers, strings, and nulls
//! (floats, bools, and byte strings are available for node scalar fields).
//! This crate owns two layers:
//!
//! - [`MapWriter`] / [`ArrayWriter`] build a document in memory and
//!   [`Document`] / [`MapReader`] / [`ValueReader`] / [`ArrayReader`] read one
//!   back without panicking on malformed input.
//! - A canonical CBOR encoder/decoder ([`encode_value`] / [`decode_value`]).
//!   Equal documents always encode to identical bytes, and the decoder rejects
//!   any non-canonical input.
//!
//! Decoding untrusted input is bounded by [`CodecConfig`].
#![forbid(unsafe_code)]

mod canonical;
mod config;
mod error;
mod map;

pub use canonical::{decode_value, decode_value_with, encode_value};
pub use ciborium::value::Value;
pub use config::{CodecConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_INPUT_LEN};
pub use error::CborError;
pub use map::{ArrayReader, ArrayWriter, Document, MapReader, MapWriter, ValueReader};
