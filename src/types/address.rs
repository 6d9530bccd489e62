//! Checksummed base-32 program encoding.
//!
//! A program (public-key hash, subaddress hash, key bytes) is encoded as
//! `prefix 1 <version><program in 5-bit groups><checksum>` with a Bech32m
//! checksum. [`tweak`] performs the regrouping between 8-bit bytes and 5-bit
//! symbols in both directions.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::primitives::iter::Fe32IterExt;
use bech32::{Bech32m, Fe32, Hrp};

pub const PROGRAM_MIN_LEN: usize = 2;
pub const PROGRAM_MAX_LEN: usize = 40;
/// Versions are a single 5-bit symbol.
pub const VERSION_MAX: u8 = 31;

/// Regroups `data` from `from_bits`-wide symbols to `to_bits`-wide symbols.
///
/// With `pad`, a final short group is filled with zero bits. Without it the
/// leftover bits must be fewer than `from_bits` and all zero, otherwise the
/// input is not a canonical encoding and `None` is returned. Symbols wider
/// than `from_bits` also yield `None`.
pub fn tweak(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    if !(1..=8).contains(&from_bits) || !(1..=8).contains(&to_bits) {
        return None;
    }
    let max_value: u32 = (1 << to_bits) - 1;
    let max_acc: u32 = (1 << (from_bits + to_bits - 1)) - 1;
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * from_bits as usize / to_bits as usize + 1);

    for &value in data {
        let value = u32::from(value);
        if value >> from_bits != 0 {
            return None;
        }
        acc = ((acc << from_bits) | value) & max_acc;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            out.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to_bits - bits)) & max_value) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & max_value) != 0 {
        return None;
    }
    Some(out)
}

fn program_len_ok(version: u8, len: usize) -> bool {
    (PROGRAM_MIN_LEN..=PROGRAM_MAX_LEN).contains(&len) && (version != 0 || len == 20 || len == 32)
}

/// Encodes `program` under `prefix` and `version`.
///
/// `None` for an invalid prefix, a version above [`VERSION_MAX`], or a
/// program length outside 2..=40 (exactly 20 or 32 for version 0).
pub fn encode_program(prefix: &str, version: u8, program: &[u8]) -> Option<String> {
    if version > VERSION_MAX || !program_len_ok(version, program.len()) {
        return None;
    }
    let hrp = Hrp::parse(prefix).ok()?;
    let mut symbols = vec![version];
    symbols.extend(tweak(program, 8, 5, true)?);
    let fes = symbols
        .into_iter()
        .map(Fe32::try_from)
        .collect::<Result<Vec<Fe32>, _>>()
        .ok()?;
    Some(fes.into_iter().with_checksum::<Bech32m>(&hrp).chars().collect())
}

/// Decodes text produced by [`encode_program`].
///
/// `None` on a bad checksum, a prefix or version other than the expected
/// ones, or a program length the encoder would refuse.
pub fn decode_program(prefix: &str, version: u8, text: &str) -> Option<Vec<u8>> {
    let checked = CheckedHrpstring::new::<Bech32m>(text).ok()?;
    if checked.hrp().to_lowercase() != prefix.to_lowercase() {
        return None;
    }

    let mut symbols = Vec::new();
    for &c in checked.data_part_ascii_no_checksum() {
        symbols.push(Fe32::from_char(char::from(c)).ok()?.to_u8());
    }
    let (&found_version, data) = symbols.split_first()?;
    if found_version != version {
        return None;
    }

    let program = tweak(data, 5, 8, false)?;
    program_len_ok(version, program.len()).then_some(program)
}
