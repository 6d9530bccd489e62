//! Shared test fixtures.

#[cfg(test)]
pub mod utils {
    use crate::types::hash::Hash;
    use crate::types::keys::{Pubkeyhash, Seckey};

    /// Deterministic secret key, identical across runs.
    pub fn fixed_seckey() -> Seckey {
        Seckey::from_seed(b"chainwire test key")
    }

    /// Distinct digest per `n`.
    pub fn test_digest(n: u64) -> Hash {
        Hash::digest(&n.to_le_bytes())
    }

    /// Public-key hash whose bytes count up from `n`.
    pub fn sample_pubkeyhash(n: u8) -> Pubkeyhash {
        let mut bytes = [0u8; 20];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = n.wrapping_add(i as u8);
        }
        Pubkeyhash::new(bytes)
    }
}
