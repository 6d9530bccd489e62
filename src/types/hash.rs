//! Hash suite and the 32-byte `Hash` type.
//!
//! | function | construction | used for |
//! |----------|--------------|----------|
//! | [`hash32`] | BLAKE2b, 4-byte output | transaction type ids |
//! | [`hash160`] | RIPEMD-160(BLAKE2b-256) | public-key and derivation hashes |
//! | [`hash256`] | BLAKE2b-256 | stream hashes, signing digests, seed derivation |
//! | [`hash512`] | SHA3-512 | sealed-box nonces |
//! | [`sha1`] | SHA-1 | asset contract checksums |

use blake2::Blake2b;
use blake2::digest::consts::{U4, U32};
use ripemd::Ripemd160;
use sha1::Sha1;
use sha3::{Digest, Sha3_512};
use std::fmt;

/// BLAKE2b-256 hash length in bytes.
pub const HASH_LEN: usize = 32;

type Blake2b256 = Blake2b<U32>;
type Blake2b32 = Blake2b<U4>;

/// Fixed-size 32-byte BLAKE2b-256 hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash, Ord, PartialOrd)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    /// Creates a zero-valued hash (all bytes are 0x00).
    pub const fn zero() -> Hash {
        Hash([0u8; HASH_LEN])
    }

    /// Hashes `data` in one call.
    pub fn digest(data: &[u8]) -> Hash {
        Hash(hash256(data))
    }

    /// Returns the hash as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Creates a builder for incremental hashing.
    pub fn builder() -> HashBuilder {
        HashBuilder::new()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Incremental BLAKE2b-256 hash builder.
#[derive(Clone, Default)]
pub struct HashBuilder {
    hasher: Blake2b256,
}

impl HashBuilder {
    /// Creates a new hash builder with empty state.
    pub fn new() -> Self {
        Self {
            hasher: Blake2b256::new(),
        }
    }

    /// Feeds data into the hash computation.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        Digest::update(&mut self.hasher, data);
        self
    }

    /// Consumes the builder and returns the final hash.
    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

/// 32-bit truncated hash.
pub fn hash32(data: &[u8]) -> [u8; 4] {
    Blake2b32::digest(data).into()
}

/// 160-bit hash: RIPEMD-160 over BLAKE2b-256.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(hash256(data)).into()
}

/// 256-bit hash: BLAKE2b-256.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// 512-bit hash: SHA3-512.
pub fn hash512(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha3_512::digest(data));
    out
}

/// SHA-1, kept for asset checksums only.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_matches_one_shot_digest() {
        let mut h = Hash::builder();
        h.update(b"wire").update(b"stream");
        assert_eq!(h.finalize(), Hash::digest(b"wirestream"));
    }

    #[test]
    fn zero_hash_is_default() {
        assert_eq!(Hash::zero(), Hash::default());
        assert!(Hash::zero().as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn display_is_lowercase_hex() {
        let hash = Hash([0xab; HASH_LEN]);
        assert_eq!(hash.to_string(), "ab".repeat(HASH_LEN));
    }

    #[test]
    fn blake2b_256_empty_vector() {
        assert_eq!(
            hex::encode(hash256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn sha3_512_abc_vector() {
        assert_eq!(
            hex::encode(hash512(b"abc")),
            "b751850b1a57168a5693cd924b6b096e08f621827444f70d884f5d0240d2712e\
             10e116e9192af3c91a7ec57647e3934057340b4cf408d5a56592f8274eec53f0"
        );
    }

    #[test]
    fn sha1_abc_vector() {
        assert_eq!(
            hex::encode(sha1(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn hash160_is_ripemd_of_blake2b() {
        let expected: [u8; 20] = Ripemd160::digest(hash256(b"key")).into();
        assert_eq!(hash160(b"key"), expected);
        assert_ne!(hash160(b"key"), hash160(b"kez"));
    }

    #[test]
    fn hash32_is_stable_and_short() {
        assert_eq!(hash32(b"Transfer"), hash32(b"Transfer"));
        assert_ne!(hash32(b"Transfer"), hash32(b"Swap"));
    }
}
