//! Encoding and decoding traits over the tagged [`Stream`].
//!
//! # Format
//!
//! - unsigned integers: uint tag + significant little-endian bytes
//! - `bool`: a single tag
//! - [`Decimal`]: decimal tag, integer part, reversed fraction digits
//! - `String`/`&str`: raw string range, or hex range for canonical `0x` text
//! - `Vec<u8>`/`[u8]`: raw string range
//! - key records: raw string range; wrong lengths decode to the zero record
//! - [`AssetId`]: its numeric id as a uint
//!
//! # Example
//!
//! ```ignore
//! use chainwire::types::encoding::{Decode, Encode};
//!
//! let bytes = 42u32.to_bytes();
//! assert_eq!(u32::from_bytes(&bytes).unwrap(), 42);
//! ```

use crate::types::asset::AssetId;
use crate::types::decimal::Decimal;
use crate::types::keys::{Pubkey, Pubkeyhash, Seckey, Signature, Subpubkeyhash};
use crate::types::stream::{Stream, StreamError};
use crate::types::uint256::Uint256;

/// Types that write themselves to a [`Stream`].
pub trait Encode {
    fn encode(&self, out: &mut Stream);

    /// Encodes into a fresh stream.
    fn to_stream(&self) -> Stream {
        let mut out = Stream::new();
        self.encode(&mut out);
        out
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.to_stream().into_bytes()
    }
}

/// Types that read themselves from a [`Stream`].
pub trait Decode: Sized {
    /// Reads one value at the cursor. On failure the cursor is unchanged.
    fn decode(input: &mut Stream) -> Result<Self, StreamError>;

    /// Decodes a value that must span all of `data`.
    fn from_bytes(data: &[u8]) -> Result<Self, StreamError> {
        let mut input = Stream::from_bytes(data.to_vec());
        let value = Self::decode(&mut input)?;
        if !input.is_finished() {
            return Err(StreamError::TrailingBytes(input.remaining()));
        }
        Ok(value)
    }
}

impl Encode for bool {
    fn encode(&self, out: &mut Stream) {
        out.write_bool(*self);
    }
}

impl Decode for bool {
    fn decode(input: &mut Stream) -> Result<Self, StreamError> {
        input.read_bool()
    }
}

impl Encode for Uint256 {
    fn encode(&self, out: &mut Stream) {
        out.write_uint(self);
    }
}

impl Decode for Uint256 {
    fn decode(input: &mut Stream) -> Result<Self, StreamError> {
        input.read_uint()
    }
}

macro_rules! impl_uint {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, out: &mut Stream) {
                    out.write_uint(&Uint256::from(*self));
                }
            }

            impl Decode for $t {
                fn decode(input: &mut Stream) -> Result<Self, StreamError> {
                    let start = input.seek();
                    let value = input.read_uint()?;
                    match value.to_u128().and_then(|v| <$t>::try_from(v).ok()) {
                        Some(v) => Ok(v),
                        None => {
                            input.set_seek(start);
                            Err(StreamError::Overflow(stringify!($t)))
                        }
                    }
                }
            }
        )*
    };
}

impl_uint!(u8, u16, u32, u64, u128);

impl Encode for Decimal {
    fn encode(&self, out: &mut Stream) {
        out.write_decimal(self);
    }
}

impl Decode for Decimal {
    fn decode(input: &mut Stream) -> Result<Self, StreamError> {
        input.read_decimal()
    }
}

impl Encode for str {
    fn encode(&self, out: &mut Stream) {
        out.write_string(self);
    }
}

impl Encode for String {
    fn encode(&self, out: &mut Stream) {
        out.write_string(self);
    }
}

impl Decode for String {
    fn decode(input: &mut Stream) -> Result<Self, StreamError> {
        input.read_string()
    }
}

impl Encode for [u8] {
    fn encode(&self, out: &mut Stream) {
        out.write_bytes(self);
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, out: &mut Stream) {
        out.write_bytes(self);
    }
}

impl Decode for Vec<u8> {
    fn decode(input: &mut Stream) -> Result<Self, StreamError> {
        input.read_bytes()
    }
}

macro_rules! impl_record {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, out: &mut Stream) {
                    out.write_bytes(self.as_bytes());
                }
            }

            impl Decode for $t {
                fn decode(input: &mut Stream) -> Result<Self, StreamError> {
                    input.read_bytes().map(|bytes| <$t>::from_slice(&bytes))
                }
            }
        )*
    };
}

impl_record!(Seckey, Pubkey, Pubkeyhash, Subpubkeyhash, Signature);

impl Encode for AssetId {
    fn encode(&self, out: &mut Stream) {
        out.write_uint(&self.to_uint256());
    }
}

impl Decode for AssetId {
    fn decode(input: &mut Stream) -> Result<Self, StreamError> {
        let start = input.seek();
        let id = input.read_uint()?;
        AssetId::from_id(&id).ok_or_else(|| {
            input.set_seek(start);
            StreamError::Overflow("asset id")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::viewable;

    #[test]
    fn native_integers_use_uint_tags() {
        assert_eq!(0u8.to_bytes(), vec![viewable::UINT_MIN]);
        assert_eq!(300u16.to_bytes(), vec![viewable::UINT_MIN + 2, 0x2c, 0x01]);
        assert_eq!(u32::from_bytes(&7u32.to_bytes()).unwrap(), 7);
        assert_eq!(u128::from_bytes(&u128::MAX.to_bytes()).unwrap(), u128::MAX);
    }

    #[test]
    fn narrow_decode_rejects_wide_values() {
        let mut stream = 256u16.to_stream();
        assert_eq!(u8::decode(&mut stream), Err(StreamError::Overflow("u8")));
        assert_eq!(stream.seek(), 0);
        assert_eq!(u16::decode(&mut stream).unwrap(), 256);
    }

    #[test]
    fn from_bytes_rejects_trailing_data() {
        let mut bytes = true.to_bytes();
        bytes.push(viewable::FALSE);
        assert_eq!(bool::from_bytes(&bytes), Err(StreamError::TrailingBytes(1)));
    }

    #[test]
    fn records_decode_wrong_length_as_zero() {
        let pkh = Pubkeyhash::new([5u8; 20]);
        assert_eq!(Pubkeyhash::from_bytes(&pkh.to_bytes()).unwrap(), pkh);
        let short = vec![1u8; 19].to_bytes();
        assert_eq!(Pubkeyhash::from_bytes(&short).unwrap(), Pubkeyhash::zero());
    }

    #[test]
    fn asset_encodes_numeric_id() {
        let btc = AssetId::from_handle("BTC", None, None);
        let bytes = btc.to_bytes();
        assert_eq!(bytes, vec![viewable::UINT_MIN + 3, b'B', b'T', b'C']);
        assert_eq!(AssetId::from_bytes(&bytes).unwrap(), btc);
        assert!(AssetId::from_bytes(&0u8.to_bytes()).is_err());
    }

    #[test]
    fn strings_and_bytes() {
        assert_eq!(String::from_bytes(&"chain".to_bytes()).unwrap(), "chain");
        assert_eq!(Vec::<u8>::from_bytes(&b"raw".to_vec().to_bytes()).unwrap(), b"raw");
        let text: &str = "0xbeef";
        assert_eq!(String::from_bytes(&text.to_bytes()).unwrap(), "0xbeef");
    }
}
