//! 256-bit unsigned integer value type.
//!
//! Every operation comes in two forms:
//! - a pure form (`add`, `shl`, ...) that borrows the receiver and returns a
//!   new value,
//! - an in-place form (`add_mut`, `shl_mut`, ...) that updates the receiver
//!   and returns it for chaining.
//!
//! Arithmetic wraps modulo 2^256. Division and remainder return `None` for a
//! zero divisor and leave the receiver untouched.
//!
//! # Byte order
//!
//! The canonical array form is big-endian ([`Uint256::to_be_bytes`],
//! [`Uint256::to_hex`]). Wire payloads take the low [`Uint256::byte_count`]
//! bytes of [`Uint256::to_le_bytes`].

use crate::types::convert::{HEX_PREFIX, strip_hex_prefix};
use primitive_types::U256;
use std::fmt;
use std::str::FromStr;

/// Largest integer that survives a round trip through an IEEE-754 double.
pub const SAFE_INTEGER_MAX: u64 = (1 << 53) - 1;

/// 256-bit unsigned integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint256(U256);

impl Uint256 {
    pub const ZERO: Uint256 = Uint256(U256([0, 0, 0, 0]));
    pub const ONE: Uint256 = Uint256(U256([1, 0, 0, 0]));
    pub const MAX: Uint256 = Uint256(U256::MAX);
    /// Width in bits.
    pub const BITS: u32 = 256;
    /// Width in bytes.
    pub const BYTES: usize = 32;

    /// Creates a value from a native integer.
    pub fn new(value: u64) -> Self {
        Self(U256::from(value))
    }

    /// Returns the wrapped `primitive_types` value.
    pub fn as_inner(&self) -> &U256 {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Number of significant bits.
    pub fn bits(&self) -> u32 {
        self.0.bits() as u32
    }

    /// Number of significant bytes; zero for zero.
    pub fn byte_count(&self) -> usize {
        (self.0.bits() + 7) / 8
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_big_endian()
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        self.0.to_little_endian()
    }

    /// Reads a big-endian byte slice of at most 32 bytes.
    pub fn from_be_slice(bytes: &[u8]) -> Option<Self> {
        (bytes.len() <= Self::BYTES).then(|| Self(U256::from_big_endian(bytes)))
    }

    /// Reads a little-endian byte slice of at most 32 bytes.
    pub fn from_le_slice(bytes: &[u8]) -> Option<Self> {
        (bytes.len() <= Self::BYTES).then(|| Self(U256::from_little_endian(bytes)))
    }

    /// Canonical hex: `0x` followed by 64 lowercase digits, big-endian.
    pub fn to_hex(&self) -> String {
        format!("{HEX_PREFIX}{}", hex::encode(self.to_be_bytes()))
    }

    /// Shortest hex form: `0x` followed by the significant digits (`0x0` for zero).
    pub fn to_compact_hex(&self) -> String {
        format!("{HEX_PREFIX}{:x}", self.0)
    }

    /// Parses hex digits with an optional `0x` prefix; at most 64 digits.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = strip_hex_prefix(text);
        if digits.is_empty() || digits.len() > 64 || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return None;
        }
        U256::from_str_radix(digits, 16).ok().map(Self)
    }

    /// Parses a decimal string.
    pub fn from_dec_str(text: &str) -> Option<Self> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        U256::from_dec_str(text).ok().map(Self)
    }

    /// Returns true if the value fits in [`SAFE_INTEGER_MAX`].
    pub fn is_safe_integer(&self) -> bool {
        self.0 <= U256::from(SAFE_INTEGER_MAX)
    }

    /// Collapses the value to a native integer if it is a safe integer.
    pub fn to_safe_integer(&self) -> Option<u64> {
        self.is_safe_integer().then(|| self.0.low_u64())
    }

    pub fn to_u64(&self) -> Option<u64> {
        (self.0.bits() <= 64).then(|| self.0.low_u64())
    }

    pub fn to_u128(&self) -> Option<u128> {
        if self.0.bits() > 128 {
            return None;
        }
        let le = self.to_le_bytes();
        let mut low = [0u8; 16];
        low.copy_from_slice(&le[..16]);
        Some(u128::from_le_bytes(low))
    }

    /// Quotient and remainder, or `None` when dividing by zero.
    pub fn div_rem(&self, divisor: &Uint256) -> Option<(Uint256, Uint256)> {
        if divisor.is_zero() {
            return None;
        }
        let (q, r) = self.0.div_mod(divisor.0);
        Some((Self(q), Self(r)))
    }

    pub fn div(&self, divisor: &Uint256) -> Option<Uint256> {
        self.div_rem(divisor).map(|(q, _)| q)
    }

    pub fn rem(&self, divisor: &Uint256) -> Option<Uint256> {
        self.div_rem(divisor).map(|(_, r)| r)
    }

    /// In-place [`Uint256::div`]; the receiver is untouched on `None`.
    pub fn div_mut(&mut self, divisor: &Uint256) -> Option<&mut Self> {
        *self = self.div(divisor)?;
        Some(self)
    }

    /// In-place [`Uint256::rem`]; the receiver is untouched on `None`.
    pub fn rem_mut(&mut self, divisor: &Uint256) -> Option<&mut Self> {
        *self = self.rem(divisor)?;
        Some(self)
    }

    /// Wrapping exponentiation.
    pub fn pow(&self, exponent: u32) -> Uint256 {
        Self(self.0.overflowing_pow(U256::from(exponent)).0)
    }

    pub fn pow_mut(&mut self, exponent: u32) -> &mut Self {
        *self = self.pow(exponent);
        self
    }

    /// Bitwise complement.
    pub fn not(&self) -> Uint256 {
        Self(!self.0)
    }

    pub fn not_mut(&mut self) -> &mut Self {
        *self = self.not();
        self
    }

    /// Two's complement negation modulo 2^256.
    pub fn neg(&self) -> Uint256 {
        Self(U256::zero().overflowing_sub(self.0).0)
    }

    pub fn neg_mut(&mut self) -> &mut Self {
        *self = self.neg();
        self
    }

    /// Left shift; shifting by 256 or more yields zero.
    pub fn shl(&self, bits: u32) -> Uint256 {
        if bits >= Self::BITS {
            return Self::ZERO;
        }
        Self(self.0 << bits)
    }

    pub fn shl_mut(&mut self, bits: u32) -> &mut Self {
        *self = self.shl(bits);
        self
    }

    /// Logical right shift; shifting by 256 or more yields zero.
    pub fn shr(&self, bits: u32) -> Uint256 {
        if bits >= Self::BITS {
            return Self::ZERO;
        }
        Self(self.0 >> bits)
    }

    pub fn shr_mut(&mut self, bits: u32) -> &mut Self {
        *self = self.shr(bits);
        self
    }

    /// Returns bit `index`; out-of-range indices read as zero.
    pub fn test_bit(&self, index: u32) -> bool {
        index < Self::BITS && self.0.bit(index as usize)
    }

    pub fn set_bit(&self, index: u32) -> Uint256 {
        self.or(&Self::ONE.shl(index))
    }

    pub fn set_bit_mut(&mut self, index: u32) -> &mut Self {
        *self = self.set_bit(index);
        self
    }

    pub fn clear_bit(&self, index: u32) -> Uint256 {
        self.and(&Self::ONE.shl(index).not())
    }

    pub fn clear_bit_mut(&mut self, index: u32) -> &mut Self {
        *self = self.clear_bit(index);
        self
    }

    pub fn flip_bit(&self, index: u32) -> Uint256 {
        self.xor(&Self::ONE.shl(index))
    }

    pub fn flip_bit_mut(&mut self, index: u32) -> &mut Self {
        *self = self.flip_bit(index);
        self
    }
}

/// Generates a pure binary operation and its in-place twin.
macro_rules! binary_ops {
    ($($(#[$doc:meta])* $name:ident / $name_mut:ident => |$a:ident, $b:ident| $body:expr;)*) => {
        impl Uint256 {
            $(
                $(#[$doc])*
                pub fn $name(&self, other: &Uint256) -> Uint256 {
                    let ($a, $b) = (self.0, other.0);
                    Uint256($body)
                }

                #[doc = concat!("In-place [`Uint256::", stringify!($name), "`]; returns the receiver.")]
                pub fn $name_mut(&mut self, other: &Uint256) -> &mut Self {
                    *self = self.$name(other);
                    self
                }
            )*
        }
    };
}

binary_ops! {
    /// Wrapping addition.
    add / add_mut => |a, b| a.overflowing_add(b).0;
    /// Wrapping subtraction.
    sub / sub_mut => |a, b| a.overflowing_sub(b).0;
    /// Wrapping multiplication.
    mul / mul_mut => |a, b| a.overflowing_mul(b).0;
    and / and_mut => |a, b| a & b;
    or / or_mut => |a, b| a | b;
    xor / xor_mut => |a, b| a ^ b;
    minimum / minimum_mut => |a, b| std::cmp::min(a, b);
    maximum / maximum_mut => |a, b| std::cmp::max(a, b);
    /// Greatest common divisor; `gcd(0, 0)` is zero.
    gcd / gcd_mut => |a, b| gcd(a, b);
}

fn gcd(mut a: U256, mut b: U256) -> U256 {
    while !b.is_zero() {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl FromStr for Uint256 {
    type Err = ();

    /// Accepts decimal, or hex with a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s).ok_or(())
        } else {
            Self::from_dec_str(s).ok_or(())
        }
    }
}

macro_rules! from_native {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Uint256 {
                fn from(value: $t) -> Self {
                    Self(U256::from(value))
                }
            }
        )*
    };
}

from_native!(u8, u16, u32, u64, u128);

impl From<U256> for Uint256 {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<Uint256> for U256 {
    fn from(value: Uint256) -> Self {
        value.0
    }
}
