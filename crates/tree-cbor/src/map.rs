// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Map/array writers and borrowing readers over the ciborium value model.
//!
//! Writers build a [`Value`] tree; nothing touches bytes until
//! [`MapWriter::encode`]. Readers borrow a decoded [`Document`] and hand out
//! typed views, reporting [`CborError::KeyNotFound`] and
//! [`CborError::TypeMismatch`] instead of panicking.

use ciborium::value::Value;

use crate::canonical::{decode_value_with, encode_value};
use crate::config::CodecConfig;
use crate::error::CborError;

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => "integer",
        Value::Bytes(_) => "bytes",
        Value::Float(_) => "float",
        Value::Text(_) => "string",
        Value::Bool(_) => "bool",
        Value::Null => "null",
        Value::Tag(_, _) => "tag",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        _ => "unknown",
    }
}

/// Builder for a single wire map.
///
/// Entries keep insertion order in memory; the canonical encoder sorts keys
/// when the map is turned into bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapWriter {
    entries: Vec<(Value, Value)>,
}

impl MapWriter {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, key: &str, value: Value) {
        self.entries.push((Value::Text(key.to_owned()), value));
    }

    /// Appends `key: null`.
    pub fn append_null(&mut self, key: &str) {
        self.push(key, Value::Null);
    }

    /// Appends a boolean entry.
    pub fn append_bool(&mut self, key: &str, value: bool) {
        self.push(key, Value::Bool(value));
    }

    /// Appends a signed integer entry.
    pub fn append_int(&mut self, key: &str, value: i64) {
        self.push(key, Value::Integer(value.into()));
    }

    /// Appends a float entry. Integral values are stored as integers on the wire.
    pub fn append_float(&mut self, key: &str, value: f64) {
        self.push(key, Value::Float(value));
    }

    /// Appends a UTF-8 string entry.
    pub fn append_string(&mut self, key: &str, value: &str) {
        self.push(key, Value::Text(value.to_owned()));
    }

    /// Appends a byte-string entry.
    pub fn append_bytes(&mut self, key: &str, value: &[u8]) {
        self.push(key, Value::Bytes(value.to_vec()));
    }

    /// Appends a nested map filled in by `fill`.
    pub fn append_map<E>(
        &mut self,
        key: &str,
        fill: impl FnOnce(&mut MapWriter) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut sub = MapWriter::new();
        fill(&mut sub)?;
        self.push(key, sub.into_value());
        Ok(())
    }

    /// Appends a nested array filled in by `fill`.
    pub fn append_array<E>(
        &mut self,
        key: &str,
        fill: impl FnOnce(&mut ArrayWriter) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut sub = ArrayWriter::new();
        fill(&mut sub)?;
        self.push(key, sub.into_value());
        Ok(())
    }

    /// Returns whether an entry with `key` was appended.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .iter()
            .any(|(k, _)| matches!(k, Value::Text(t) if t == key))
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no entries were appended.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the builder into a ciborium map value.
    pub fn into_value(self) -> Value {
        Value::Map(self.entries)
    }

    /// Encodes the map as canonical CBOR bytes.
    pub fn encode(self) -> Result<Vec<u8>, CborError> {
        encode_value(&self.into_value())
    }
}

/// Builder for a wire array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayWriter {
    items: Vec<Value>,
}

impl ArrayWriter {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `null`.
    pub fn append_null(&mut self) {
        self.items.push(Value::Null);
    }

    /// Appends a signed integer.
    pub fn append_int(&mut self, value: i64) {
        self.items.push(Value::Integer(value.into()));
    }

    /// Appends a UTF-8 string.
    pub fn append_string(&mut self, value: &str) {
        self.items.push(Value::Text(value.to_owned()));
    }

    /// Appends a nested map filled in by `fill`.
    pub fn append_map<E>(
        &mut self,
        fill: impl FnOnce(&mut MapWriter) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut sub = MapWriter::new();
        fill(&mut sub)?;
        self.items.push(sub.into_value());
        Ok(())
    }

    /// Appends a nested array filled in by `fill`.
    pub fn append_array<E>(
        &mut self,
        fill: impl FnOnce(&mut ArrayWriter) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut sub = ArrayWriter::new();
        fill(&mut sub)?;
        self.items.push(sub.into_value());
        Ok(())
    }

    /// Number of items appended so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether no items were appended.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Converts the builder into a ciborium array value.
    pub fn into_value(self) -> Value {
        Value::Array(self.items)
    }
}

/// A decoded wire document; the root of every read.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Decodes canonical CBOR bytes using the default limits.
    pub fn decode(bytes: &[u8]) -> Result<Self, CborError> {
        Self::decode_with(bytes, &CodecConfig::default())
    }

    /// Decodes canonical CBOR bytes, enforcing `config`.
    pub fn decode_with(bytes: &[u8], config: &CodecConfig) -> Result<Self, CborError> {
        Ok(Self {
            root: decode_value_with(bytes, config)?,
        })
    }

    /// Wraps an already-built value (e.g. from [`MapWriter::into_value`]).
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Typed view of the root value.
    pub fn root(&self) -> ValueReader<'_> {
        ValueReader::new(&self.root)
    }

    /// The root value, which must be a map.
    pub fn as_map(&self) -> Result<MapReader<'_>, CborError> {
        self.root().as_map()
    }
}

/// Borrowed, typed view of one wire value.
#[derive(Debug, Clone, Copy)]
pub struct ValueReader<'a> {
    value: &'a Value,
}

impl<'a> ValueReader<'a> {
    /// Wraps a value.
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    fn mismatch(&self, expected: &'static str) -> CborError {
        CborError::TypeMismatch {
            expected,
            found: type_name(self.value),
        }
    }

    /// Name of the wire type held (`"map"`, `"string"`, ...).
    pub fn type_name(&self) -> &'static str {
        type_name(self.value)
    }

    /// Returns whether the value is `null`.
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Reads a boolean.
    pub fn as_bool(&self) -> Result<bool, CborError> {
        match self.value {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Reads a signed integer that fits in `i64`.
    pub fn as_int(&self) -> Result<i64, CborError> {
        match self.value {
            Value::Integer(n) => {
                i64::try_from(*n).map_err(|_| CborError::Decode("integer out of i64 range".into()))
            }
            _ => Err(self.mismatch("integer")),
        }
    }

    /// Reads a float; integers are accepted because integral floats are
    /// written as integers.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Result<f64, CborError> {
        match self.value {
            Value::Float(f) => Ok(*f),
            Value::Integer(n) => Ok(i128::from(*n) as f64),
            _ => Err(self.mismatch("float")),
        }
    }

    /// Reads a UTF-8 string.
    pub fn as_string(&self) -> Result<&'a str, CborError> {
        match self.value {
            Value::Text(s) => Ok(s.as_str()),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Reads a byte string.
    pub fn as_bytes(&self) -> Result<&'a [u8], CborError> {
        match self.value {
            Value::Bytes(b) => Ok(b.as_slice()),
            _ => Err(self.mismatch("bytes")),
        }
    }

    /// Reads a map.
    pub fn as_map(&self) -> Result<MapReader<'a>, CborError> {
        match self.value {
            Value::Map(entries) => Ok(MapReader { entries }),
            _ => Err(self.mismatch("map")),
        }
    }

    /// Reads an array.
    pub fn as_array(&self) -> Result<ArrayReader<'a>, CborError> {
        match self.value {
            Value::Array(items) => Ok(ArrayReader { items }),
            _ => Err(self.mismatch("array")),
        }
    }
}

/// Borrowed view of a wire map with string keys.
#[derive(Debug, Clone, Copy)]
pub struct MapReader<'a> {
    entries: &'a [(Value, Value)],
}

impl<'a> MapReader<'a> {
    /// Looks up `key`, returning `None` when absent.
    pub fn get(&self, key: &str) -> Option<ValueReader<'a>> {
        self.entries.iter().find_map(|(k, v)| match k {
            Value::Text(t) if t == key => Some(ValueReader::new(v)),
            _ => None,
        })
    }

    /// Looks up `key`, failing with [`CborError::KeyNotFound`] when absent.
    pub fn at(&self, key: &str) -> Result<ValueReader<'a>, CborError> {
        self.get(key)
            .ok_or_else(|| CborError::KeyNotFound(key.to_owned()))
    }

    /// Returns whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the string keys of the map.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        let entries = self.entries;
        entries.iter().filter_map(|(k, _)| match k {
            Value::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }
}

/// Borrowed view of a wire array.
#[derive(Debug, Clone, Copy)]
pub struct ArrayReader<'a> {
    items: &'a [Value],
}

impl<'a> ArrayReader<'a> {
    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item at `index`, if any.
    pub fn get(&self, index: usize) -> Option<ValueReader<'a>> {
        self.items.get(index).map(ValueReader::new)
    }

    /// Iterates over the items in order.
    pub fn iter(&self) -> impl Iterator<Item = ValueReader<'a>> + 'a {
        let items = self.items;
        items.iter().map(ValueReader::new)
    }
}
