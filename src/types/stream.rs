//! Tagged binary value stream.
//!
//! Every value is a tag byte (see [`crate::types::viewable`]) followed by an
//! optional payload. Writers append to the buffer; readers advance a cursor.
//! A read that fails leaves the cursor where the read started, so callers may
//! retry a different read at the same position.

use crate::types::convert::{bytes_to_hex, bytes_to_prefixed_hex, hex_to_bytes, is_canonical_hex, is_hex};
use crate::types::decimal::Decimal;
use crate::types::hash::Hash;
use crate::types::uint256::Uint256;
use crate::types::viewable::{self, Viewable};
use chainwire_derive::Error;
use std::cell::OnceCell;

/// Errors raised while reading a [`Stream`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("unexpected end of stream: needed {needed} bytes at offset {offset}")]
    UnexpectedEnd { needed: usize, offset: usize },

    #[error("unexpected tag {tag} where {expected} was expected")]
    UnexpectedTag { tag: u8, expected: &'static str },

    #[error("byte string is not valid UTF-8")]
    InvalidUtf8,

    #[error("value does not fit in {0}")]
    Overflow(&'static str),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// A single value read without knowing its type in advance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    Decimal(Decimal),
    Bool(bool),
    Uint(Uint256),
    /// Byte string from the raw range.
    Bytes(Vec<u8>),
    /// Byte string from the hex range.
    HexBytes(Vec<u8>),
}

/// Append-only byte buffer with a read cursor and a cached content hash.
#[derive(Clone, Debug, Default)]
pub struct Stream {
    data: Vec<u8>,
    seek: usize,
    hash: OnceCell<Hash>,
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Stream {}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing bytes with the cursor at the start.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            seek: 0,
            hash: OnceCell::new(),
        }
    }

    /// Decodes a hex transport string (prefix optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        hex_to_bytes(text).map(Self::from_bytes)
    }

    /// Builds a stream from transport text: hex if it decodes as hex,
    /// otherwise its UTF-8 bytes.
    pub fn from_transport(text: &str) -> Self {
        if !text.is_empty() && is_hex(text) {
            if let Some(stream) = Self::from_hex(text) {
                return stream;
            }
        }
        Self::from_bytes(text.as_bytes().to_vec())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn seek(&self) -> usize {
        self.seek
    }

    /// Moves the cursor, clamped to the end of the buffer.
    pub fn set_seek(&mut self, position: usize) {
        self.seek = position.min(self.data.len());
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.seek
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Whole buffer as lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.data)
    }

    /// BLAKE2b-256 of the buffer, cached until the next write.
    pub fn hash(&self) -> Hash {
        *self.hash.get_or_init(|| Hash::digest(&self.data))
    }

    fn push(&mut self, bytes: &[u8]) {
        self.hash.take();
        self.data.extend_from_slice(bytes);
    }

    /// Appends another stream's bytes.
    pub fn append(&mut self, other: &Stream) {
        self.push(&other.data);
    }

    pub fn write_uint(&mut self, value: &Uint256) {
        let size = value.byte_count();
        let le = value.to_le_bytes();
        self.push(&[viewable::UINT_MIN + size as u8]);
        self.push(&le[..size]);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_uint(&Uint256::new(value));
    }

    pub fn write_bool(&mut self, value: bool) {
        self.push(&[if value { viewable::TRUE } else { viewable::FALSE }]);
    }

    /// Writes the sign and fraction presence in the tag, then the integer
    /// part, then the fraction digits reversed as an integer. Reversal keeps
    /// leading fraction zeros (`0.05` stores `50`).
    pub fn write_decimal(&mut self, value: &Decimal) {
        if value.is_nan() {
            self.push(&[viewable::DECIMAL_NAN]);
            return;
        }
        if value.is_zero() {
            self.push(&[viewable::DECIMAL_ZERO]);
            return;
        }
        self.push(&[Viewable::decimal_tag(value.is_negative(), value.has_fraction())]);
        self.write_uint(&value.integer());
        if value.has_fraction() {
            let reversed: String = value.fraction().chars().rev().collect();
            // A normalized fraction has at most 77 digits, which always fits.
            self.write_uint(&Uint256::from_dec_str(&reversed).unwrap_or_default());
        }
    }

    fn write_sized(&mut self, bytes: &[u8], short_min: u8, long_tag: u8) {
        if bytes.len() <= viewable::STRING_MAX_LENGTH {
            self.push(&[short_min + bytes.len() as u8]);
        } else {
            self.push(&[long_tag]);
            self.write_uint(&Uint256::from(bytes.len() as u64));
        }
        self.push(bytes);
    }

    /// Writes bytes in the raw string range.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_sized(bytes, viewable::STRING_MIN, viewable::STRING_LONG);
    }

    /// Writes bytes in the hex string range; they read back as `0x` text.
    pub fn write_hex_bytes(&mut self, bytes: &[u8]) {
        self.write_sized(bytes, viewable::HEX_STRING_MIN, viewable::HEX_STRING_LONG);
    }

    /// Writes text. Canonical `0x` hex goes through the hex range as the
    /// decoded bytes; anything else is written as UTF-8.
    pub fn write_string(&mut self, text: &str) {
        if is_canonical_hex(text) {
            if let Some(bytes) = hex_to_bytes(text) {
                self.write_hex_bytes(&bytes);
                return;
            }
        }
        self.write_bytes(text.as_bytes());
    }

    /// Runs `read`, restoring the cursor if it fails.
    fn atomic<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, StreamError>,
    ) -> Result<T, StreamError> {
        let start = self.seek;
        let result = read(self);
        if result.is_err() {
            self.seek = start;
        }
        result
    }

    fn take(&mut self, n: usize) -> Result<&[u8], StreamError> {
        if self.remaining() < n {
            return Err(StreamError::UnexpectedEnd {
                needed: n,
                offset: self.seek,
            });
        }
        let start = self.seek;
        self.seek += n;
        Ok(&self.data[start..self.seek])
    }

    fn read_tag(&mut self) -> Result<u8, StreamError> {
        Ok(self.take(1)?[0])
    }

    /// Tag at the cursor, without consuming it.
    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.seek).copied()
    }

    fn read_uint_body(&mut self) -> Result<Uint256, StreamError> {
        let tag = self.read_tag()?;
        match Viewable::from_tag(tag) {
            Viewable::Uint(size) => {
                let bytes = self.take(size)?;
                Uint256::from_le_slice(bytes).ok_or(StreamError::Overflow("uint256"))
            }
            _ => Err(StreamError::UnexpectedTag {
                tag,
                expected: "uint",
            }),
        }
    }

    pub fn read_uint(&mut self) -> Result<Uint256, StreamError> {
        self.atomic(Self::read_uint_body)
    }

    pub fn read_u64(&mut self) -> Result<u64, StreamError> {
        self.atomic(|s| s.read_uint_body()?.to_u64().ok_or(StreamError::Overflow("u64")))
    }

    pub fn read_bool(&mut self) -> Result<bool, StreamError> {
        self.atomic(|s| {
            let tag = s.read_tag()?;
            match Viewable::from_tag(tag) {
                Viewable::Bool(value) => Ok(value),
                _ => Err(StreamError::UnexpectedTag {
                    tag,
                    expected: "boolean",
                }),
            }
        })
    }

    fn read_decimal_body(&mut self, tag: u8) -> Result<Decimal, StreamError> {
        match Viewable::from_tag(tag) {
            Viewable::DecimalNaN => Ok(Decimal::nan()),
            Viewable::DecimalZero => Ok(Decimal::zero()),
            Viewable::Decimal { negative, fraction } => {
                let integer = self.read_uint_body()?;
                let digits = if fraction {
                    self.read_uint_body()?.to_string().chars().rev().collect()
                } else {
                    String::new()
                };
                Decimal::from_parts(negative, integer, &digits)
                    .ok_or(StreamError::Overflow("decimal fraction"))
            }
            _ => Err(StreamError::UnexpectedTag {
                tag,
                expected: "decimal",
            }),
        }
    }

    pub fn read_decimal(&mut self) -> Result<Decimal, StreamError> {
        self.atomic(|s| {
            let tag = s.read_tag()?;
            s.read_decimal_body(tag)
        })
    }

    /// Returns the bytes and whether they came from the hex range.
    fn read_sized_body(&mut self, tag: u8) -> Result<(Vec<u8>, bool), StreamError> {
        match Viewable::from_tag(tag) {
            Viewable::Bytes { len, hex } => Ok((self.take(len)?.to_vec(), hex)),
            Viewable::LongBytes { hex } => {
                let len = self.read_uint_body()?;
                let len = len
                    .to_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or(StreamError::Overflow("usize"))?;
                Ok((self.take(len)?.to_vec(), hex))
            }
            _ => Err(StreamError::UnexpectedTag {
                tag,
                expected: "byte string",
            }),
        }
    }

    /// Reads a byte string from either string range.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, StreamError> {
        self.atomic(|s| {
            let tag = s.read_tag()?;
            s.read_sized_body(tag).map(|(bytes, _)| bytes)
        })
    }

    /// Reads text: raw strings as UTF-8, hex strings as `0x` text.
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        self.atomic(|s| {
            let tag = s.read_tag()?;
            let (bytes, hex) = s.read_sized_body(tag)?;
            if hex {
                Ok(bytes_to_prefixed_hex(&bytes))
            } else {
                String::from_utf8(bytes).map_err(|_| StreamError::InvalidUtf8)
            }
        })
    }

    /// Reads whatever value is at the cursor.
    pub fn read_primitive(&mut self) -> Result<Primitive, StreamError> {
        self.atomic(|s| {
            let tag = s.peek_tag().ok_or(StreamError::UnexpectedEnd {
                needed: 1,
                offset: s.seek,
            })?;
            let view = Viewable::from_tag(tag);
            match view {
                Viewable::Uint(_) => s.read_uint_body().map(Primitive::Uint),
                Viewable::Bool(value) => {
                    s.seek += 1;
                    Ok(Primitive::Bool(value))
                }
                _ if view.is_decimal() => {
                    s.seek += 1;
                    s.read_decimal_body(tag).map(Primitive::Decimal)
                }
                _ if view.is_bytes() => {
                    s.seek += 1;
                    let (bytes, hex) = s.read_sized_body(tag)?;
                    Ok(if hex {
                        Primitive::HexBytes(bytes)
                    } else {
                        Primitive::Bytes(bytes)
                    })
                }
                _ => Err(StreamError::UnexpectedTag {
                    tag,
                    expected: "any value",
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pow2(n: u32) -> Uint256 {
        Uint256::ONE.shl(n)
    }

    fn decimal_roundtrip(text: &str) -> String {
        let mut stream = Stream::new();
        stream.write_decimal(&text.parse().unwrap());
        stream.read_decimal().unwrap().to_string()
    }

    #[test]
    fn uint_roundtrip_and_tag() {
        let values = [
            Uint256::ZERO,
            Uint256::new(1),
            Uint256::new(255),
            Uint256::new(256),
            Uint256::new(65535),
            Uint256::new(65536),
            Uint256::new(u64::MAX),
            pow2(255),
        ];
        for value in values {
            let mut stream = Stream::new();
            stream.write_uint(&value);
            assert_eq!(
                stream.data()[0],
                viewable::UINT_MIN + value.byte_count() as u8
            );
            assert_eq!(stream.len(), 1 + value.byte_count());
            assert_eq!(stream.read_uint().unwrap(), value);
            assert!(stream.is_finished());
        }
    }

    #[test]
    fn uint_payload_is_little_endian() {
        let mut stream = Stream::new();
        stream.write_u64(0x0102);
        assert_eq!(stream.data(), &[viewable::UINT_MIN + 2, 0x02, 0x01]);
    }

    #[test]
    fn zero_uses_tag_only() {
        let mut stream = Stream::new();
        stream.write_uint(&Uint256::ZERO);
        assert_eq!(stream.data(), &[viewable::UINT_MIN]);
    }

    #[test]
    fn decimal_keeps_leading_fraction_zeros() {
        assert_eq!(decimal_roundtrip("0.05"), "0.05");
        assert_eq!(decimal_roundtrip("-12.3400"), "-12.34");
        assert_eq!(decimal_roundtrip("1000"), "1000");
        assert_eq!(decimal_roundtrip("-7"), "-7");
    }

    #[test]
    fn decimal_fraction_written_reversed() {
        let mut stream = Stream::new();
        stream.write_decimal(&"0.05".parse().unwrap());
        assert_eq!(
            stream.data(),
            &[viewable::DECIMAL_POSITIVE_FRACTION, viewable::UINT_MIN, viewable::UINT_MIN + 1, 50]
        );
    }

    #[test]
    fn decimal_specials_are_single_byte() {
        let mut stream = Stream::new();
        stream.write_decimal(&Decimal::nan());
        stream.write_decimal(&Decimal::zero());
        assert_eq!(stream.data(), &[viewable::DECIMAL_NAN, viewable::DECIMAL_ZERO]);
        assert!(stream.read_decimal().unwrap().is_nan());
        assert_eq!(stream.read_decimal().unwrap(), Decimal::zero());
    }

    #[test]
    fn string_at_short_limit_uses_fixed_tag() {
        let text = "a".repeat(viewable::STRING_MAX_LENGTH);
        let mut stream = Stream::new();
        stream.write_string(&text);
        assert_eq!(stream.data()[0], viewable::STRING_MAX);
        assert_eq!(stream.len(), 1 + viewable::STRING_MAX_LENGTH);
        assert_eq!(stream.read_string().unwrap(), text);
    }

    #[test]
    fn string_over_short_limit_uses_escape_tag() {
        let text = "a".repeat(viewable::STRING_MAX_LENGTH + 1);
        let mut stream = Stream::new();
        stream.write_string(&text);
        assert_eq!(stream.data()[0], viewable::STRING_LONG);
        assert_eq!(stream.data()[1], viewable::UINT_MIN + 1);
        assert_eq!(stream.data()[2], 106);
        assert_eq!(stream.read_string().unwrap(), text);
    }

    #[test]
    fn hex_strings_use_hex_range_at_both_sizes() {
        let short = format!("0x{}", "ab".repeat(viewable::STRING_MAX_LENGTH));
        let long = format!("0x{}", "ab".repeat(viewable::STRING_MAX_LENGTH + 1));
        let mut stream = Stream::new();
        stream.write_string(&short);
        stream.write_string(&long);
        assert_eq!(stream.data()[0], viewable::HEX_STRING_MAX);
        assert_eq!(
            stream.data()[1 + viewable::STRING_MAX_LENGTH],
            viewable::HEX_STRING_LONG
        );
        assert_eq!(stream.read_string().unwrap(), short);
        assert_eq!(stream.read_string().unwrap(), long);
    }

    #[test]
    fn non_canonical_hex_stays_raw() {
        for text in ["0xABCD", "0xabc", "abcd"] {
            let mut stream = Stream::new();
            stream.write_string(text);
            assert!(stream.data()[0] <= viewable::STRING_MAX, "{text}");
            assert_eq!(stream.read_string().unwrap(), text);
        }
    }

    #[test]
    fn failed_read_restores_cursor() {
        let mut stream = Stream::new();
        stream.write_bool(true);
        assert!(matches!(
            stream.read_uint(),
            Err(StreamError::UnexpectedTag { tag: viewable::TRUE, .. })
        ));
        assert_eq!(stream.seek(), 0);
        assert!(stream.read_bool().unwrap());
    }

    #[test]
    fn truncated_payload_fails_without_consuming() {
        let mut stream = Stream::from_bytes(vec![viewable::UINT_MIN + 4, 1, 2]);
        assert!(matches!(
            stream.read_uint(),
            Err(StreamError::UnexpectedEnd { needed: 4, offset: 1 })
        ));
        assert_eq!(stream.seek(), 0);

        let mut long = Stream::from_bytes(vec![viewable::STRING_LONG, viewable::UINT_MIN + 1, 200, b'x']);
        assert!(long.read_bytes().is_err());
        assert_eq!(long.seek(), 0);
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let mut stream = Stream::new();
        stream.write_bytes(&[0xff, 0xfe]);
        assert_eq!(stream.read_string(), Err(StreamError::InvalidUtf8));
        assert_eq!(stream.read_bytes().unwrap(), vec![0xff, 0xfe]);
    }

    #[test]
    fn hash_cache_invalidated_on_write() {
        let mut stream = Stream::new();
        stream.write_bool(false);
        let first = stream.hash();
        assert_eq!(stream.hash(), first);
        stream.write_bool(true);
        assert_ne!(stream.hash(), first);
        assert_eq!(stream.hash(), Hash::digest(stream.data()));
    }

    #[test]
    fn transport_detects_hex() {
        let mut stream = Stream::new();
        stream.write_u64(7);
        let hex = stream.to_hex();
        assert_eq!(Stream::from_transport(&hex), stream);
        assert_eq!(Stream::from_transport(&format!("0x{hex}")), stream);
        assert_eq!(Stream::from_transport("hello").data(), b"hello");
    }

    #[test]
    fn primitive_reader_walks_mixed_values() {
        let mut stream = Stream::new();
        stream.write_u64(9);
        stream.write_bool(false);
        stream.write_decimal(&"1.5".parse().unwrap());
        stream.write_string("hi");
        stream.write_string("0x00ff");
        assert_eq!(stream.read_primitive().unwrap(), Primitive::Uint(Uint256::new(9)));
        assert_eq!(stream.read_primitive().unwrap(), Primitive::Bool(false));
        assert_eq!(
            stream.read_primitive().unwrap(),
            Primitive::Decimal("1.5".parse().unwrap())
        );
        assert_eq!(stream.read_primitive().unwrap(), Primitive::Bytes(b"hi".to_vec()));
        assert_eq!(stream.read_primitive().unwrap(), Primitive::HexBytes(vec![0, 0xff]));
        assert!(stream.read_primitive().is_err());
    }
}
