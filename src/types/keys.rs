//! Fixed-length key, hash and signature records.
//!
//! Construction never fails: input of the wrong length (or undecodable hex)
//! yields a zero-filled record of the right size. Whether the bytes form a
//! usable key or signature is decided later by the crypto layer.

use crate::types::convert::{bytes_to_hex, hex_to_bytes};
use std::fmt;

macro_rules! fixed_record {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Record length in bytes.
            pub const LEN: usize = $len;

            /// Wraps an array of the exact length.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// All-zero record.
            pub const fn zero() -> Self {
                Self([0u8; $len])
            }

            /// Copies `bytes` if the length matches, otherwise returns [`Self::zero`].
            pub fn from_slice(bytes: &[u8]) -> Self {
                let mut out = [0u8; $len];
                if bytes.len() == $len {
                    out.copy_from_slice(bytes);
                }
                Self(out)
            }

            /// Decodes hex (prefix optional); zero on malformed input.
            pub fn from_hex(text: &str) -> Self {
                hex_to_bytes(text)
                    .map(|bytes| Self::from_slice(&bytes))
                    .unwrap_or_default()
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|&b| b == 0)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_vec(&self) -> Vec<u8> {
                self.0.to_vec()
            }

            /// Lowercase hex, no prefix.
            pub fn to_hex(&self) -> String {
                bytes_to_hex(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::zero()
            }
        }

        impl From<Option<&[u8]>> for $name {
            fn from(bytes: Option<&[u8]>) -> Self {
                bytes.map(Self::from_slice).unwrap_or_default()
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.to_hex())
            }
        }
    };
}

fixed_record!(
    /// secp256k1 secret scalar.
    Seckey,
    32
);
fixed_record!(
    /// Compressed secp256k1 public key.
    Pubkey,
    33
);
fixed_record!(
    /// 160-bit hash of a public key.
    Pubkeyhash,
    20
);
fixed_record!(
    /// Masked public-key hash followed by its derivation hash.
    Subpubkeyhash,
    40
);
fixed_record!(
    /// Recoverable ECDSA signature: `r || s || recovery id`.
    Signature,
    65
);

impl Subpubkeyhash {
    /// Joins a masked hash and a derivation hash.
    pub fn from_parts(masked: &Pubkeyhash, derivation: &Pubkeyhash) -> Self {
        let mut out = [0u8; 40];
        out[..20].copy_from_slice(masked.as_bytes());
        out[20..].copy_from_slice(derivation.as_bytes());
        Self(out)
    }

    /// First half: base hash XOR derivation hash.
    pub fn masked(&self) -> Pubkeyhash {
        Pubkeyhash::from_slice(&self.0[..20])
    }

    /// Second half.
    pub fn derivation_hash(&self) -> Pubkeyhash {
        Pubkeyhash::from_slice(&self.0[20..])
    }

    /// XOR of both halves, which is the unmasked base hash.
    pub fn base_pubkeyhash(&self) -> Pubkeyhash {
        let mut out = [0u8; 20];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] ^ self.0[i + 20];
        }
        Pubkeyhash(out)
    }
}

impl Signature {
    /// Signature bytes with trailing zeros removed; the zero signature trims to nothing.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &self.0[..end]
    }

    /// Inverse of [`Signature::trimmed`]: right-pads with zeros.
    ///
    /// Input longer than 65 bytes yields the zero signature.
    pub fn from_trimmed(bytes: &[u8]) -> Self {
        let mut out = [0u8; 65];
        if bytes.len() <= 65 {
            out[..bytes.len()].copy_from_slice(bytes);
        }
        Self(out)
    }

    /// Recovery id byte.
    pub fn recovery_id(&self) -> u8 {
        self.0[64]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_length_yields_zero_record() {
        assert_eq!(Pubkeyhash::from_slice(&[1u8; 19]), Pubkeyhash::zero());
        assert_eq!(Pubkey::from_slice(&[1u8; 34]), Pubkey::zero());
        assert_eq!(Seckey::from_slice(&[]), Seckey::zero());
        assert_eq!(Signature::from(None), Signature::zero());
        assert_eq!(Signature::zero().as_bytes().len(), 65);
    }

    #[test]
    fn exact_length_is_copied() {
        let bytes = [7u8; 33];
        let key = Pubkey::from_slice(&bytes);
        assert_eq!(key.as_bytes(), &bytes);
        assert!(!key.is_zero());
    }

    #[test]
    fn hex_roundtrip_and_bad_hex() {
        let pkh = Pubkeyhash::new([0xab; 20]);
        assert_eq!(Pubkeyhash::from_hex(&pkh.to_hex()), pkh);
        assert_eq!(Pubkeyhash::from_hex(&format!("0x{}", pkh.to_hex())), pkh);
        assert_eq!(Pubkeyhash::from_hex("zz"), Pubkeyhash::zero());
        assert_eq!(Pubkeyhash::from_hex("abcd"), Pubkeyhash::zero());
    }

    #[test]
    fn equality_is_bytewise() {
        let mut bytes = [3u8; 32];
        let a = Seckey::new(bytes);
        bytes[31] = 4;
        assert_ne!(a, Seckey::new(bytes));
        assert_eq!(a, Seckey::from_slice(&[3u8; 32]));
    }

    #[test]
    fn subpubkeyhash_halves_xor_to_base() {
        let base = Pubkeyhash::new([0x0f; 20]);
        let derivation = Pubkeyhash::new([0xf1; 20]);
        let mut masked = [0u8; 20];
        for (i, b) in masked.iter_mut().enumerate() {
            *b = base.as_bytes()[i] ^ derivation.as_bytes()[i];
        }
        let sub = Subpubkeyhash::from_parts(&Pubkeyhash::new(masked), &derivation);
        assert_eq!(sub.base_pubkeyhash(), base);
        assert_eq!(sub.derivation_hash(), derivation);
    }

    #[test]
    fn signature_trim_roundtrip() {
        let mut bytes = [0u8; 65];
        bytes[..10].copy_from_slice(&[9u8; 10]);
        let sig = Signature::new(bytes);
        assert_eq!(sig.trimmed().len(), 10);
        assert_eq!(Signature::from_trimmed(sig.trimmed()), sig);
        assert!(Signature::zero().trimmed().is_empty());
        assert_eq!(Signature::from_trimmed(&[1u8; 66]), Signature::zero());
    }
}
