//! Addresses and masked subaddresses.
//!
//! A subaddress hides its base public-key hash behind a derivation hash:
//!
//! ```text
//! dh   = hash160(derivation)          (20 zero bytes for "")
//! sub  = (pkh XOR dh) || dh           (40 bytes)
//! pkh  = sub[..20] XOR sub[20..]
//! ```
//!
//! The default derivation encodes as a plain 20-byte address, so every base
//! address is also a valid subaddress. Anyone who knows an address and a
//! derivation string can produce the matching subaddress with
//! [`mask_address_of`]; without the string, two subaddresses of one base
//! cannot be linked.

use crate::crypto::network::NetworkParams;
use crate::debug;
use crate::types::address::{decode_program, encode_program};
use crate::types::hash::hash160;
use crate::types::keys::{Pubkey, Pubkeyhash, Subpubkeyhash};

/// Hash of caller-chosen derivation data; zero for the empty string.
pub fn derivation_hash(derivation: &str) -> Pubkeyhash {
    if derivation.is_empty() {
        return Pubkeyhash::zero();
    }
    Pubkeyhash::new(hash160(derivation.as_bytes()))
}

/// Masks `pkh` under `derivation`.
pub fn subaddress_hash(pkh: &Pubkeyhash, derivation: &str) -> Subpubkeyhash {
    let dh = derivation_hash(derivation);
    let mut masked = [0u8; 20];
    for (i, byte) in masked.iter_mut().enumerate() {
        *byte = pkh.as_bytes()[i] ^ dh.as_bytes()[i];
    }
    Subpubkeyhash::from_parts(&Pubkeyhash::new(masked), &dh)
}

pub fn encode_address(pkh: &Pubkeyhash, params: &NetworkParams) -> Option<String> {
    encode_program(params.address.prefix, params.address.version, pkh.as_bytes())
}

/// Decodes a plain address. Only 20-byte programs are accepted.
pub fn decode_address(text: &str, params: &NetworkParams) -> Option<Pubkeyhash> {
    let program = decode_program(params.address.prefix, params.address.version, text)?;
    if program.len() != Pubkeyhash::LEN {
        debug!("address program has {} bytes, expected 20", program.len());
        return None;
    }
    Some(Pubkeyhash::from_slice(&program))
}

/// Address of a public key.
pub fn address_of(pubkey: &Pubkey, params: &NetworkParams) -> Option<String> {
    encode_address(&pubkey.pubkeyhash(), params)
}

/// Encodes a subaddress record: 20 bytes when the derivation half is zero,
/// the full 40-byte record otherwise.
pub fn encode_subpubkeyhash(sub: &Subpubkeyhash, params: &NetworkParams) -> Option<String> {
    if sub.derivation_hash().is_zero() {
        return encode_address(&sub.masked(), params);
    }
    encode_program(params.address.prefix, params.address.version, sub.as_bytes())
}

/// Encodes the subaddress of `pkh` under `derivation`.
pub fn encode_subaddress(
    pkh: &Pubkeyhash,
    derivation: &str,
    params: &NetworkParams,
) -> Option<String> {
    encode_subpubkeyhash(&subaddress_hash(pkh, derivation), params)
}

/// Decodes an address or subaddress into the 40-byte record. A 20-byte
/// program gets a zero derivation half.
pub fn decode_subaddress(text: &str, params: &NetworkParams) -> Option<Subpubkeyhash> {
    let program = decode_program(params.address.prefix, params.address.version, text)?;
    match program.len() {
        Pubkeyhash::LEN => Some(Subpubkeyhash::from_parts(
            &Pubkeyhash::from_slice(&program),
            &Pubkeyhash::zero(),
        )),
        Subpubkeyhash::LEN => Some(Subpubkeyhash::from_slice(&program)),
        other => {
            debug!("subaddress program has {other} bytes, expected 20 or 40");
            None
        }
    }
}

/// Re-derives the subaddress of `address` (itself a plain address or a
/// subaddress) under `derivation`.
pub fn mask_address_of(address: &str, derivation: &str, params: &NetworkParams) -> Option<String> {
    let base = decode_subaddress(address, params)?.base_pubkeyhash();
    encode_subaddress(&base, derivation, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::network::{MAINNET, REGTEST, TESTNET};
    use crate::utils::test_utils::utils::sample_pubkeyhash;

    #[test]
    fn address_roundtrip() {
        let pkh = sample_pubkeyhash(1);
        let text = encode_address(&pkh, &MAINNET).unwrap();
        assert!(text.starts_with("cw1"));
        assert_eq!(decode_address(&text, &MAINNET), Some(pkh));
    }

    #[test]
    fn address_rejects_wrong_prefix() {
        let text = encode_address(&sample_pubkeyhash(2), &MAINNET).unwrap();
        assert_eq!(decode_address(&text, &TESTNET), None);
    }

    #[test]
    fn address_rejects_wrong_version() {
        let pkh = sample_pubkeyhash(3);
        let text = encode_program(MAINNET.address.prefix, MAINNET.address.version + 1, pkh.as_bytes())
            .unwrap();
        assert_eq!(decode_address(&text, &MAINNET), None);
    }

    #[test]
    fn address_rejects_nineteen_byte_program() {
        let text = encode_program(MAINNET.address.prefix, MAINNET.address.version, &[9u8; 19]).unwrap();
        assert_eq!(decode_address(&text, &MAINNET), None);
        assert_eq!(decode_subaddress(&text, &MAINNET), None);
    }

    #[test]
    fn derivation_hash_of_empty_is_zero() {
        assert!(derivation_hash("").is_zero());
        assert_eq!(derivation_hash("shop"), Pubkeyhash::new(hash160(b"shop")));
    }

    #[test]
    fn subaddress_halves_xor_to_base() {
        let pkh = sample_pubkeyhash(4);
        let text = encode_subaddress(&pkh, "invoice-17", &REGTEST).unwrap();
        let sub = decode_subaddress(&text, &REGTEST).unwrap();
        assert_eq!(sub.as_bytes().len(), 40);
        assert_eq!(sub.base_pubkeyhash(), pkh);
        assert_eq!(sub.derivation_hash(), derivation_hash("invoice-17"));
        assert_eq!(sub, subaddress_hash(&pkh, "invoice-17"));
    }

    #[test]
    fn default_derivation_is_plain_address() {
        let pkh = sample_pubkeyhash(5);
        let plain = encode_address(&pkh, &MAINNET).unwrap();
        assert_eq!(encode_subaddress(&pkh, "", &MAINNET).as_deref(), Some(plain.as_str()));
        let sub = decode_subaddress(&plain, &MAINNET).unwrap();
        assert_eq!(sub.masked(), pkh);
        assert!(sub.derivation_hash().is_zero());
    }

    #[test]
    fn masking_is_idempotent() {
        let base = encode_address(&sample_pubkeyhash(6), &TESTNET).unwrap();
        let once = mask_address_of(&base, "merchant", &TESTNET).unwrap();
        let twice = mask_address_of(&once, "merchant", &TESTNET).unwrap();
        assert_eq!(once, twice);
        assert_ne!(once, base);
        assert_eq!(mask_address_of(&once, "", &TESTNET), Some(base));
    }

    #[test]
    fn different_derivations_are_unlinkable_programs() {
        let pkh = sample_pubkeyhash(7);
        let a = subaddress_hash(&pkh, "a");
        let b = subaddress_hash(&pkh, "b");
        assert_ne!(a.masked(), b.masked());
        assert_eq!(a.base_pubkeyhash(), b.base_pubkeyhash());
    }
}
