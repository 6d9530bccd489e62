//! Single-byte type tags of the wire stream.
//!
//! | tags | meaning |
//! |------|---------|
//! | 0 | decimal NaN |
//! | 1 | decimal zero |
//! | 2, 3 | positive decimal without / with fraction |
//! | 4, 5 | negative decimal without / with fraction |
//! | 6, 7 | true, false |
//! | 8..=40 | unsigned integer; tag − 8 payload bytes, little-endian |
//! | 41..=146 | raw byte string; tag − 41 bytes |
//! | 147..=252 | hex byte string; tag − 147 bytes |
//! | 253, 254 | long raw / long hex byte string, uint length prefix |
//! | 255 | invalid |

pub const DECIMAL_NAN: u8 = 0;
pub const DECIMAL_ZERO: u8 = 1;
pub const DECIMAL_POSITIVE: u8 = 2;
pub const DECIMAL_POSITIVE_FRACTION: u8 = 3;
pub const DECIMAL_NEGATIVE: u8 = 4;
pub const DECIMAL_NEGATIVE_FRACTION: u8 = 5;

pub const TRUE: u8 = 6;
pub const FALSE: u8 = 7;

pub const UINT_MIN: u8 = 8;
pub const UINT_MAX: u8 = UINT_MIN + 32;

/// Longest byte string that still uses the fixed-size tag form.
pub const STRING_MAX_LENGTH: usize = 105;

pub const STRING_MIN: u8 = UINT_MAX + 1;
pub const STRING_MAX: u8 = STRING_MIN + STRING_MAX_LENGTH as u8;
pub const HEX_STRING_MIN: u8 = STRING_MAX + 1;
pub const HEX_STRING_MAX: u8 = HEX_STRING_MIN + STRING_MAX_LENGTH as u8;
pub const STRING_LONG: u8 = HEX_STRING_MAX + 1;
pub const HEX_STRING_LONG: u8 = STRING_LONG + 1;
pub const INVALID: u8 = 255;

/// Category of a tag byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Viewable {
    Decimal { negative: bool, fraction: bool },
    DecimalZero,
    DecimalNaN,
    Bool(bool),
    /// Payload byte count.
    Uint(usize),
    /// Inline byte string of the given length.
    Bytes { len: usize, hex: bool },
    /// Byte string with a uint length prefix.
    LongBytes { hex: bool },
    Invalid,
}

impl Viewable {
    pub fn from_tag(tag: u8) -> Viewable {
        match tag {
            DECIMAL_NAN => Viewable::DecimalNaN,
            DECIMAL_ZERO => Viewable::DecimalZero,
            DECIMAL_POSITIVE..=DECIMAL_NEGATIVE_FRACTION => Viewable::Decimal {
                negative: tag >= DECIMAL_NEGATIVE,
                fraction: tag == DECIMAL_POSITIVE_FRACTION || tag == DECIMAL_NEGATIVE_FRACTION,
            },
            TRUE => Viewable::Bool(true),
            FALSE => Viewable::Bool(false),
            UINT_MIN..=UINT_MAX => Viewable::Uint(usize::from(tag - UINT_MIN)),
            STRING_MIN..=STRING_MAX => Viewable::Bytes {
                len: usize::from(tag - STRING_MIN),
                hex: false,
            },
            HEX_STRING_MIN..=HEX_STRING_MAX => Viewable::Bytes {
                len: usize::from(tag - HEX_STRING_MIN),
                hex: true,
            },
            STRING_LONG => Viewable::LongBytes { hex: false },
            HEX_STRING_LONG => Viewable::LongBytes { hex: true },
            _ => Viewable::Invalid,
        }
    }

    /// Tag of a decimal with the given sign and fraction presence.
    pub fn decimal_tag(negative: bool, fraction: bool) -> u8 {
        match (negative, fraction) {
            (false, false) => DECIMAL_POSITIVE,
            (false, true) => DECIMAL_POSITIVE_FRACTION,
            (true, false) => DECIMAL_NEGATIVE,
            (true, true) => DECIMAL_NEGATIVE_FRACTION,
        }
    }

    pub fn is_decimal(&self) -> bool {
        matches!(
            self,
            Viewable::Decimal { .. } | Viewable::DecimalZero | Viewable::DecimalNaN
        )
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Viewable::Bytes { .. } | Viewable::LongBytes { .. })
    }

    /// Short name used in error messages and dumps.
    pub fn name(&self) -> &'static str {
        match self {
            Viewable::Decimal { .. } | Viewable::DecimalZero | Viewable::DecimalNaN => "decimal",
            Viewable::Bool(_) => "boolean",
            Viewable::Uint(_) => "uint",
            Viewable::Bytes { hex: false, .. } | Viewable::LongBytes { hex: false } => "string",
            Viewable::Bytes { hex: true, .. } | Viewable::LongBytes { hex: true } => "hex",
            Viewable::Invalid => "invalid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_layout() {
        assert_eq!(UINT_MAX, 40);
        assert_eq!(STRING_MIN, 41);
        assert_eq!(STRING_MAX, 146);
        assert_eq!(HEX_STRING_MIN, 147);
        assert_eq!(HEX_STRING_MAX, 252);
        assert_eq!(STRING_LONG, 253);
        assert_eq!(HEX_STRING_LONG, 254);
    }

    #[test]
    fn every_tag_classifies() {
        for tag in 0..=u8::MAX {
            let view = Viewable::from_tag(tag);
            assert_eq!(view == Viewable::Invalid, tag == INVALID, "tag {tag}");
        }
    }

    #[test]
    fn decimal_tags_roundtrip() {
        for negative in [false, true] {
            for fraction in [false, true] {
                let tag = Viewable::decimal_tag(negative, fraction);
                assert_eq!(Viewable::from_tag(tag), Viewable::Decimal { negative, fraction });
            }
        }
    }

    #[test]
    fn sized_ranges() {
        assert_eq!(Viewable::from_tag(UINT_MIN), Viewable::Uint(0));
        assert_eq!(Viewable::from_tag(UINT_MAX), Viewable::Uint(32));
        assert_eq!(
            Viewable::from_tag(STRING_MAX),
            Viewable::Bytes { len: STRING_MAX_LENGTH, hex: false }
        );
        assert_eq!(
            Viewable::from_tag(HEX_STRING_MIN),
            Viewable::Bytes { len: 0, hex: true }
        );
    }
}
