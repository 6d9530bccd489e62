//! Anonymous public-key encryption.
//!
//! Format: `[33B ephemeral pubkey][XChaCha20-Poly1305 ciphertext + 16B tag]`
//!
//! - key   = BLAKE2b-256(ECDH(ephemeral, recipient) || epk || rpk)
//! - nonce = SHA3-512(epk || rpk)[..24]
//!
//! The ephemeral key is fresh per message, so the derived nonce never repeats
//! under one key.

use crate::types::hash::{Hash, hash512};
use crate::types::keys::{Pubkey, Seckey};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use k256::ecdh::{EphemeralSecret, diffie_hellman};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand_core::OsRng;
use zeroize::Zeroizing;

/// Bytes added to the plaintext length by [`seal`].
pub const SEAL_OVERHEAD: usize = Pubkey::LEN + 16;

const NONCE_LEN: usize = 24;

fn derive_key(shared: &[u8], epk: &Pubkey, rpk: &Pubkey) -> Zeroizing<[u8; 32]> {
    let mut builder = Hash::builder();
    builder
        .update(shared)
        .update(epk.as_bytes())
        .update(rpk.as_bytes());
    Zeroizing::new(builder.finalize().0)
}

fn derive_nonce(epk: &Pubkey, rpk: &Pubkey) -> [u8; NONCE_LEN] {
    let mut input = Vec::with_capacity(2 * Pubkey::LEN);
    input.extend_from_slice(epk.as_bytes());
    input.extend_from_slice(rpk.as_bytes());
    let digest = hash512(&input);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest[..NONCE_LEN]);
    nonce
}

fn cipher(key: &Zeroizing<[u8; 32]>) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(Key::from_slice(&key[..]))
}

/// Encrypts `plaintext` to `recipient`. `None` if the recipient key is invalid.
pub fn seal(recipient: &Pubkey, plaintext: &[u8]) -> Option<Vec<u8>> {
    let recipient_point = PublicKey::from_sec1_bytes(recipient.as_bytes()).ok()?;
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let epk = Pubkey::from_slice(ephemeral.public_key().to_encoded_point(true).as_bytes());

    let shared = ephemeral.diffie_hellman(&recipient_point);
    let key = derive_key(shared.raw_secret_bytes().as_slice(), &epk, recipient);
    let nonce = derive_nonce(&epk, recipient);
    let ciphertext = cipher(&key)
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .ok()?;

    let mut out = Vec::with_capacity(Pubkey::LEN + ciphertext.len());
    out.extend_from_slice(epk.as_bytes());
    out.extend_from_slice(&ciphertext);
    Some(out)
}

/// Decrypts a sealed message with the recipient's secret key.
///
/// `None` if the key is invalid, the message is truncated or tampered with,
/// or it was sealed to someone else.
pub fn open(recipient: &Seckey, sealed: &[u8]) -> Option<Vec<u8>> {
    if sealed.len() < SEAL_OVERHEAD {
        return None;
    }
    let secret = SecretKey::from_slice(recipient.as_bytes()).ok()?;
    let rpk = Pubkey::from_slice(secret.public_key().to_encoded_point(true).as_bytes());

    let (epk_bytes, ciphertext) = sealed.split_at(Pubkey::LEN);
    let epk = Pubkey::from_slice(epk_bytes);
    let ephemeral_point = PublicKey::from_sec1_bytes(epk.as_bytes()).ok()?;

    let shared = diffie_hellman(secret.to_nonzero_scalar(), ephemeral_point.as_affine());
    let key = derive_key(shared.raw_secret_bytes().as_slice(), &epk, &rpk);
    let nonce = derive_nonce(&epk, &rpk);
    cipher(&key)
        .decrypt(XNonce::from_slice(&nonce), ciphertext)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::fixed_seckey;

    #[test]
    fn seal_open_roundtrip() {
        let seckey = fixed_seckey();
        let pubkey = seckey.pubkey().unwrap();
        let sealed = seal(&pubkey, b"subaddress derivation data").unwrap();
        assert_eq!(sealed.len(), 26 + SEAL_OVERHEAD);
        assert_eq!(open(&seckey, &sealed).unwrap(), b"subaddress derivation data");
    }

    #[test]
    fn sealing_twice_differs() {
        let pubkey = fixed_seckey().pubkey().unwrap();
        assert_ne!(seal(&pubkey, b"x"), seal(&pubkey, b"x"));
    }

    #[test]
    fn wrong_key_or_tampering_yields_none() {
        let seckey = fixed_seckey();
        let sealed = seal(&seckey.pubkey().unwrap(), b"secret").unwrap();
        assert_eq!(open(&Seckey::generate(), &sealed), None);

        let mut tampered = sealed.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 1;
        assert_eq!(open(&seckey, &tampered), None);

        assert_eq!(open(&seckey, &sealed[..SEAL_OVERHEAD - 1]), None);
        assert_eq!(open(&Seckey::zero(), &sealed), None);
    }

    #[test]
    fn invalid_recipient_yields_none() {
        assert_eq!(seal(&Pubkey::zero(), b"data"), None);
    }
}
