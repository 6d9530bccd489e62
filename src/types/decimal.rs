//! Arbitrary-precision decimal values as carried on the wire.
//!
//! A decimal is either NaN or a sign, a 256-bit integer part and a string of
//! fractional digits. The fraction never has trailing zeros, so `-12.3400`
//! and `-12.34` are the same value, and `-0` is plain zero.

use crate::types::uint256::Uint256;
use chainwire_derive::Error;
use std::fmt;
use std::str::FromStr;

/// Longest fraction that still fits a 256-bit integer once reversed.
pub const MAX_FRACTION_DIGITS: usize = 77;

#[derive(Debug, Error)]
#[error("invalid decimal literal `{0}`")]
pub struct ParseDecimalError(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Repr {
    NaN,
    Finite {
        negative: bool,
        integer: Uint256,
        fraction: String,
    },
}

/// Decimal number. NaN compares equal to itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decimal(Repr);

impl Decimal {
    pub fn nan() -> Self {
        Decimal(Repr::NaN)
    }

    pub fn zero() -> Self {
        Decimal(Repr::Finite {
            negative: false,
            integer: Uint256::ZERO,
            fraction: String::new(),
        })
    }

    /// Builds a normalized decimal.
    ///
    /// Returns `None` if `fraction` contains anything but ASCII digits or
    /// has more than [`MAX_FRACTION_DIGITS`] significant digits.
    pub fn from_parts(negative: bool, integer: Uint256, fraction: &str) -> Option<Self> {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > MAX_FRACTION_DIGITS {
            return None;
        }
        let negative = negative && !(integer.is_zero() && fraction.is_empty());
        Some(Decimal(Repr::Finite {
            negative,
            integer,
            fraction: fraction.to_string(),
        }))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.0, Repr::NaN)
    }

    pub fn is_zero(&self) -> bool {
        match &self.0 {
            Repr::NaN => false,
            Repr::Finite {
                integer, fraction, ..
            } => integer.is_zero() && fraction.is_empty(),
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self.0, Repr::Finite { negative: true, .. })
    }

    /// Integer part; zero for NaN.
    pub fn integer(&self) -> Uint256 {
        match &self.0 {
            Repr::NaN => Uint256::ZERO,
            Repr::Finite { integer, .. } => *integer,
        }
    }

    /// Fractional digits without trailing zeros; empty for integers and NaN.
    pub fn fraction(&self) -> &str {
        match &self.0 {
            Repr::NaN => "",
            Repr::Finite { fraction, .. } => fraction,
        }
    }

    pub fn has_fraction(&self) -> bool {
        !self.fraction().is_empty()
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::zero()
    }
}

impl From<Uint256> for Decimal {
    fn from(value: Uint256) -> Self {
        Decimal(Repr::Finite {
            negative: false,
            integer: value,
            fraction: String::new(),
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::NaN => write!(f, "NaN"),
            Repr::Finite {
                negative,
                integer,
                fraction,
            } => {
                if *negative {
                    write!(f, "-")?;
                }
                write!(f, "{integer}")?;
                if !fraction.is_empty() {
                    write!(f, ".{fraction}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let text = s.trim();
        if text.eq_ignore_ascii_case("nan") {
            return Ok(Decimal::nan());
        }

        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (integer_digits, fraction_digits) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if integer_digits.is_empty() && fraction_digits.is_empty() {
            return Err(invalid());
        }

        let integer = if integer_digits.is_empty() {
            Uint256::ZERO
        } else {
            Uint256::from_dec_str(integer_digits).ok_or_else(invalid)?
        };
        Decimal::from_parts(negative, integer, fraction_digits).ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    #[test]
    fn trailing_fraction_zeros_are_dropped() {
        assert_eq!(dec("-12.3400"), dec("-12.34"));
        assert_eq!(dec("-12.3400").to_string(), "-12.34");
        assert_eq!(dec("7.000").to_string(), "7");
        assert!(!dec("7.000").has_fraction());
    }

    #[test]
    fn leading_fraction_zeros_are_kept() {
        let d = dec("0.05");
        assert_eq!(d.fraction(), "05");
        assert_eq!(d.to_string(), "0.05");
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(dec("-0"), Decimal::zero());
        assert_eq!(dec("-0.000"), Decimal::zero());
        assert!(!dec("-0").is_negative());
    }

    #[test]
    fn nan_parses_and_displays() {
        assert!(dec("NaN").is_nan());
        assert!(dec("nan").is_nan());
        assert_eq!(Decimal::nan().to_string(), "NaN");
        assert!(!Decimal::nan().is_zero());
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in ["", "-", ".", "1.2.3", "abc", "1e5", "--1", "1.-2"] {
            assert!(bad.parse::<Decimal>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn fraction_length_is_bounded() {
        let ok = format!("0.{}", "9".repeat(MAX_FRACTION_DIGITS));
        let too_long = format!("0.{}", "9".repeat(MAX_FRACTION_DIGITS + 1));
        assert!(ok.parse::<Decimal>().is_ok());
        assert!(too_long.parse::<Decimal>().is_err());
    }

    #[test]
    fn accepts_bare_fraction_and_plus_sign() {
        assert_eq!(dec(".5"), dec("0.5"));
        assert_eq!(dec("+3"), Decimal::from(Uint256::new(3)));
    }
}
