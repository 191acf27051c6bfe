// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic CBOR encoder/decoder (canonical subset) for tree documents.
//!
//! Encoding rules: definite lengths only, minimal-width integers and lengths,
//! map keys sorted bytewise by their encoding, no tags, floats in the
//! narrowest exact width (integral floats become integers). The decoder
//! rejects anything the encoder would not produce.

use ciborium::value::{Integer, Value};
use half::f16;

use crate::config::CodecConfig;
use crate::error::CborError;

type Result<T> = std::result::Result<T, CborError>;

/// Encodes `val` into canonical CBOR bytes.
pub fn encode_value(val: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    enc_value(val, &mut out)?;
    Ok(out)
}

/// Decodes one canonical CBOR value using the default limits.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    decode_value_with(bytes, &CodecConfig::default())
}

/// Decodes one canonical CBOR value, enforcing the limits in `config`.
pub fn decode_value_with(bytes: &[u8], config: &CodecConfig) -> Result<Value> {
    if bytes.len() > config.max_input_len {
        return Err(CborError::InputTooLarge {
            len: bytes.len(),
            limit: config.max_input_len,
        });
    }
    let mut dec = Dec {
        bytes,
        idx: 0,
        max_depth: config.max_depth,
    };
    let v = dec.value(0)?;
    if dec.idx != bytes.len() {
        return Err(CborError::Trailing);
    }
    Ok(v)
}

fn enc_value(v: &Value, out: &mut Vec<u8>) -> Result<()> {
    match v {
        Value::Bool(b) => out.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => out.push(0xf6),
        Value::Integer(n) => enc_int(i128::from(*n), out),
        Value::Float(f) => enc_float(*f, out),
        Value::Text(s) => {
            enc_len(3, s.len(), out);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            enc_len(2, b.len(), out);
            out.extend_from_slice(b);
        }
        Value::Array(items) => {
            enc_len(4, items.len(), out);
            for it in items {
                enc_value(it, out)?;
            }
        }
        Value::Map(entries) => {
            let mut buf: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let mut kb = Vec::new();
                enc_value(k, &mut kb)?;
                buf.push((kb, v));
            }

            buf.sort_by(|a, b| a.0.cmp(&b.0));

            if buf.windows(2).any(|win| win[0].0 == win[1].0) {
                return Err(CborError::MapKeyDuplicate);
            }

            enc_len(5, buf.len(), out);
            for (kb, v) in buf {
                out.extend_from_slice(&kb);
                enc_value(v, out)?;
            }
        }
        Value::Tag(_, _) => return Err(CborError::Tag),
        _ => return Err(CborError::Decode("unsupported simple value".into())),
    }
    Ok(())
}

fn enc_len(major: u8, len: usize, out: &mut Vec<u8>) {
    write_major(major, len as u128, out);
}

fn enc_int(n: i128, out: &mut Vec<u8>) {
    if n >= 0 {
        write_major(0, n.unsigned_abs(), out);
    } else {
        write_major(1, (-1 - n).unsigned_abs(), out);
    }
}

fn enc_float(f: f64, out: &mut Vec<u8>) {
    if f.is_nan() {
        write_half(f16::NAN, out);
        return;
    }
    if f.is_infinite() {
        let h = if f.is_sign_positive() {
            f16::INFINITY
        } else {
            f16::NEG_INFINITY
        };
        write_half(h, out);
        return;
    }
    if let Some(i) = integral(f) {
        enc_int(i, out);
        return;
    }
    let h = f16::from_f64(f);
    if h.to_f64() == f {
        write_half(h, out);
        return;
    }
    let f32v = f as f32;
    if f64::from(f32v) == f {
        out.push(0xfa);
        out.extend_from_slice(&f32v.to_be_bytes());
    } else {
        out.push(0xfb);
        out.extend_from_slice(&f.to_be_bytes());
    }
}

/// Returns the integer a finite float represents exactly, if any.
fn integral(f: f64) -> Option<i128> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    let i = f as i128;
    // u64::MAX and -(2^64) bound what CBOR majors 0/1 can carry.
    if (i as f64) == f && i >= -(1i128 << 64) && i <= i128::from(u64::MAX) {
        Some(i)
    } else {
        None
    }
}

fn write_half(h: f16, out: &mut Vec<u8>) {
    out.push(0xf9);
    out.extend_from_slice(&h.to_bits().to_be_bytes());
}

fn write_major(major: u8, n: u128, out: &mut Vec<u8>) {
    debug_assert!(major <= 7);
    let head = major << 5;
    if let Ok(small) = u8::try_from(n) {
        if small <= 23 {
            out.push(head | small);
        } else {
            out.push(head | 24);
            out.push(small);
        }
    } else if let Ok(v) = u16::try_from(n) {
        out.push(head | 25);
        out.extend_from_slice(&v.to_be_bytes());
    } else if let Ok(v) = u32::try_from(n) {
        out.push(head | 26);
        out.extend_from_slice(&v.to_be_bytes());
    } else {
        out.push(head | 27);
        out.extend_from_slice(&(n as u64).to_be_bytes());
    }
}

/// Upper bound on up-front allocation for one array or map. A length prefix
/// only proves one input byte per item, but each decoded item costs a whole
/// `Value`.
const MAX_PREALLOC: usize = 1024;

struct Dec<'a> {
    bytes: &'a [u8],
    idx: usize,
    max_depth: usize,
}

impl<'a> Dec<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.idx.checked_add(n).ok_or(CborError::Incomplete)?;
        let slice = self.bytes.get(self.idx..end).ok_or(CborError::Incomplete)?;
        self.idx = end;
        Ok(slice)
    }

    fn read_uint(&mut self, nbytes: usize) -> Result<u64> {
        let slice = self.take(nbytes)?;
        Ok(slice.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    fn read_len(&mut self, info: u8) -> Result<u64> {
        let n = match info {
            0..=23 => return Ok(u64::from(info)),
            24 => self.read_uint(1)?,
            25 => self.read_uint(2)?,
            26 => self.read_uint(4)?,
            27 => self.read_uint(8)?,
            31 => return Err(CborError::Indefinite),
            _ => return Err(CborError::Decode("invalid length info".into())),
        };
        let minimal = match info {
            24 => n > 23,
            25 => n > 0xff,
            26 => n > 0xffff,
            _ => n > 0xffff_ffff,
        };
        if minimal {
            Ok(n)
        } else {
            Err(CborError::NonCanonicalInt)
        }
    }

    fn read_count(&mut self, info: u8) -> Result<usize> {
        let n = self.read_len(info)?;
        let n = usize::try_from(n).map_err(|_| CborError::Incomplete)?;
        // Every item takes at least one byte; reject lengths the input cannot hold.
        if n > self.bytes.len().saturating_sub(self.idx) {
            return Err(CborError::Incomplete);
        }
        Ok(n)
    }

    fn read_float(&mut self, nbytes: usize) -> Result<f64> {
        let slice = self.take(nbytes)?;
        let f = match slice {
            [a, b] => f16::from_bits(u16::from_be_bytes([*a, *b])).to_f64(),
            [a, b, c, d] => f64::from(f32::from_be_bytes([*a, *b, *c, *d])),
            [a, b, c, d, e, f, g, h] => f64::from_be_bytes([*a, *b, *c, *d, *e, *f, *g, *h]),
            _ => return Err(CborError::Decode("invalid float width".into())),
        };
        if f.is_nan() || f.is_infinite() {
            return if nbytes == 2 {
                Ok(f)
            } else {
                Err(CborError::NonCanonicalFloat)
            };
        }
        if integral(f).is_some() {
            return Err(CborError::FloatShouldBeInt);
        }
        let fits_half = f16::from_f64(f).to_f64() == f;
        let fits_single = f64::from(f as f32) == f;
        let canonical = match nbytes {
            2 => true,
            4 => !fits_half,
            _ => !fits_half && !fits_single,
        };
        if canonical {
            Ok(f)
        } else {
            Err(CborError::NonCanonicalFloat)
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            return Err(CborError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        let b0 = self.take(1)?[0];
        let major = b0 >> 5;
        let info = b0 & 0x1f;

        match major {
            0 => Ok(Value::Integer(Integer::from(self.read_len(info)?))),
            1 => {
                let n = self.read_len(info)?;
                let neg = -1i128 - i128::from(n);
                let i = Integer::try_from(neg)
                    .map_err(|_| CborError::Decode("integer out of range".into()))?;
                Ok(Value::Integer(i))
            }
            2 | 3 => {
                let len = self.read_count(info)?;
                let data = self.take(len)?;
                if major == 2 {
                    Ok(Value::Bytes(data.to_vec()))
                } else {
                    let s = std::str::from_utf8(data)
                        .map_err(|e| CborError::Decode(format!("utf8: {e}")))?;
                    Ok(Value::Text(s.to_owned()))
                }
            }
            4 => {
                let len = self.read_count(info)?;
                let mut items = Vec::with_capacity(len.min(MAX_PREALLOC));
                for _ in 0..len {
                    items.push(self.value(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            5 => {
                let len = self.read_count(info)?;
                let mut entries = Vec::with_capacity(len.min(MAX_PREALLOC));
                let bytes = self.bytes;
                let mut last_key: Option<&'a [u8]> = None;
                for _ in 0..len {
                    let key_start = self.idx;
                    let k = self.value(depth + 1)?;
                    let kb = &bytes[key_start..self.idx];
                    if let Some(prev) = last_key {
                        if kb == prev {
                            return Err(CborError::MapKeyDuplicate);
                        }
                        if kb < prev {
                            return Err(CborError::MapKeyOrder);
                        }
                    }
                    last_key = Some(kb);
                    let v = self.value(depth + 1)?;
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            }
            6 => Err(CborError::Tag),
            _ => match info {
                20 => Ok(Value::Bool(false)),
                21 => Ok(Value::Bool(true)),
                22 => Ok(Value::Null),
                25 => Ok(Value::Float(self.read_float(2)?)),
                26 => Ok(Value::Float(self.read_float(4)?)),
                27 => Ok(Value::Float(self.read_float(8)?)),
                31 => Err(CborError::Indefinite),
                _ => Err(CborError::Decode("simple value not supported".into())),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn map_keys_are_sorted_on_encode() {
        let v = Value::Map(vec![
            (Value::Text("b".into()), Value::Integer(1.into())),
            (Value::Text("a".into()), Value::Integer(2.into())),
        ]);
        let bytes = encode_value(&v).expect("encode");
        assert_eq!(bytes, [0xa2, 0x61, 0x61, 0x02, 0x61, 0x62, 0x01]);
    }

    #[test]
    fn duplicate_keys_rejected_on_encode() {
        let v = Value::Map(vec![
            (Value::Text("a".into()), Value::Null),
            (Value::Text("a".into()), Value::Null),
        ]);
        assert_eq!(encode_value(&v), Err(CborError::MapKeyDuplicate));
    }

    #[test]
    fn integral_float_encodes_as_int() {
        let bytes = encode_value(&Value::Float(42.0)).expect("encode");
        assert_eq!(bytes, [0x18, 0x2a]);
    }

    #[test]
    fn negative_integers_round_trip() {
        for n in [-1i64, -24, -25, -256, -65_537, i64::MIN] {
            let bytes = encode_value(&Value::Integer(n.into())).expect("encode");
            let back = decode_value(&bytes).expect("decode");
            assert_eq!(back, Value::Integer(n.into()), "value {n}");
        }
    }

    #[test]
    fn depth_limit_enforced() {
        // [[[[0]]]] nests four arrays deep.
        let bytes = [0x81, 0x81, 0x81, 0x81, 0x00];
        let config = CodecConfig {
            max_depth: 2,
            ..CodecConfig::default()
        };
        assert_eq!(
            decode_value_with(&bytes, &config),
            Err(CborError::DepthExceeded { limit: 2 })
        );
        assert!(decode_value(&bytes).is_ok());
    }

    #[test]
    fn long_array_decodes_past_the_preallocation_cap() {
        // 65536 zeros behind a four-byte length prefix.
        let mut bytes = vec![0x9a, 0x00, 0x01, 0x00, 0x00];
        bytes.resize(bytes.len() + 65536, 0x00);
        let value = decode_value(&bytes).expect("decode");
        assert!(matches!(value, Value::Array(ref items) if items.len() == 65536));
        assert_eq!(encode_value(&value).expect("encode"), bytes);
    }

    #[test]
    fn oversized_length_prefix_is_incomplete() {
        // Array claiming 2^32 elements with no payload.
        let bytes = [0x9b, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(decode_value(&bytes), Err(CborError::Incomplete));
    }
}
