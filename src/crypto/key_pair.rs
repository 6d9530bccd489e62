//! secp256k1 keys: generation, derivation, recoverable ECDSA signatures and
//! the text encodings of secret and public keys.
//!
//! The records themselves live in [`crate::types::keys`] and are plain bytes.
//! Every operation here validates them on use and reports failure as `None`
//! (or `false` for verification) instead of an error.

use crate::crypto::network::{MESSAGE_DOMAIN, MESSAGE_MAX_BYTES, NetworkParams};
use crate::debug;
use crate::types::address::{decode_program, encode_program};
use crate::types::hash::{Hash, hash160, hash256};
use crate::types::keys::{Pubkey, Pubkeyhash, Seckey, Signature};
use crate::types::stream::Stream;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

fn secret_key(seckey: &Seckey) -> Option<SecretKey> {
    SecretKey::from_slice(seckey.as_bytes()).ok()
}

fn compress(point: &PublicKey) -> Pubkey {
    Pubkey::from_slice(point.to_encoded_point(true).as_bytes())
}

fn verifying_key(pubkey: &Pubkey) -> Option<VerifyingKey> {
    VerifyingKey::from_sec1_bytes(pubkey.as_bytes()).ok()
}

/// Draws 32 random bytes and keeps them if they form a valid scalar.
fn sample() -> Option<Seckey> {
    let mut candidate = Zeroizing::new([0u8; 32]);
    OsRng.fill_bytes(&mut candidate[..]);
    let key = Seckey::new(*candidate);
    key.is_valid().then_some(key)
}

/// Hashes a message under [`MESSAGE_DOMAIN`].
///
/// Both parts are framed as stream byte strings so that the domain and the
/// message cannot be re-split. `None` if the message exceeds
/// [`MESSAGE_MAX_BYTES`].
pub fn message_digest(message: &[u8]) -> Option<Hash> {
    if message.len() > MESSAGE_MAX_BYTES {
        return None;
    }
    let mut stream = Stream::new();
    stream.write_bytes(MESSAGE_DOMAIN.as_bytes());
    stream.write_bytes(message);
    Some(stream.hash())
}

impl Seckey {
    /// Generates a random secret key.
    ///
    /// Loops until the OS random source yields a valid scalar; a miss has
    /// probability below 2^-127 per draw.
    pub fn generate() -> Seckey {
        let mut misses = 0u64;
        loop {
            if let Some(key) = sample() {
                if misses > 0 {
                    debug!("secret key generation rejected {misses} candidates");
                }
                return key;
            }
            misses += 1;
        }
    }

    /// [`Seckey::generate`] giving up after `max_attempts` draws.
    pub fn try_generate(max_attempts: usize) -> Option<Seckey> {
        (0..max_attempts).find_map(|_| sample())
    }

    /// Derives a secret key from a seed by re-hashing until the digest is a
    /// valid scalar.
    pub fn from_seed(seed: &[u8]) -> Seckey {
        let mut digest = Zeroizing::new(hash256(seed));
        let mut rounds = 1u64;
        loop {
            let key = Seckey::new(*digest);
            if key.is_valid() {
                if rounds > 1 {
                    debug!("seed derivation took {rounds} rounds");
                }
                return key;
            }
            *digest = hash256(&digest[..]);
            rounds += 1;
        }
    }

    /// [`Seckey::from_seed`] giving up after `max_rounds` hashes.
    pub fn try_from_seed(seed: &[u8], max_rounds: usize) -> Option<Seckey> {
        let mut digest = Zeroizing::new(hash256(seed));
        for _ in 0..max_rounds {
            let key = Seckey::new(*digest);
            if key.is_valid() {
                return Some(key);
            }
            *digest = hash256(&digest[..]);
        }
        None
    }

    /// True if the bytes are a non-zero scalar below the curve order.
    pub fn is_valid(&self) -> bool {
        secret_key(self).is_some()
    }

    pub fn pubkey(&self) -> Option<Pubkey> {
        secret_key(self).map(|sk| compress(&sk.public_key()))
    }

    pub fn pubkeyhash(&self) -> Option<Pubkeyhash> {
        self.pubkey().map(|pk| pk.pubkeyhash())
    }

    /// Signs a 32-byte digest, producing `r || s || recovery id`.
    pub fn sign(&self, digest: &Hash) -> Option<Signature> {
        let key = SigningKey::from_slice(self.as_bytes()).ok()?;
        let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice()).ok()?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte();
        Some(Signature::new(out))
    }

    /// Signs `message` under the message domain.
    pub fn sign_message(&self, message: &[u8]) -> Option<Signature> {
        self.sign(&message_digest(message)?)
    }
}

impl Pubkey {
    /// True if the bytes are a compressed point on the curve.
    pub fn is_valid(&self) -> bool {
        verifying_key(self).is_some()
    }

    /// `hash160` of the key bytes. Computed for any bytes, valid or not.
    pub fn pubkeyhash(&self) -> Pubkeyhash {
        Pubkeyhash::new(hash160(self.as_bytes()))
    }

    pub fn verify(&self, digest: &Hash, signature: &Signature) -> bool {
        let Some(key) = verifying_key(self) else {
            return false;
        };
        let Ok(sig) = EcdsaSignature::from_slice(&signature.as_bytes()[..64]) else {
            return false;
        };
        key.verify_prehash(digest.as_slice(), &sig).is_ok()
    }

    pub fn verify_message(&self, message: &[u8], signature: &Signature) -> bool {
        message_digest(message).is_some_and(|digest| self.verify(&digest, signature))
    }
}

impl Signature {
    /// Recovers the signer's public key from a signature over `digest`.
    pub fn recover(&self, digest: &Hash) -> Option<Pubkey> {
        let sig = EcdsaSignature::from_slice(&self.as_bytes()[..64]).ok()?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id())?;
        let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id).ok()?;
        Some(Pubkey::from_slice(key.to_encoded_point(true).as_bytes()))
    }

    pub fn recover_message_signer(&self, message: &[u8]) -> Option<Pubkey> {
        self.recover(&message_digest(message)?)
    }
}

/// Encodes a secret key under the network's secret-key prefix.
pub fn encode_seckey(seckey: &Seckey, params: &NetworkParams) -> Option<String> {
    encode_program(params.seckey.prefix, params.seckey.version, seckey.as_bytes())
}

pub fn decode_seckey(text: &str, params: &NetworkParams) -> Option<Seckey> {
    let bytes = Zeroizing::new(decode_program(params.seckey.prefix, params.seckey.version, text)?);
    (bytes.len() == Seckey::LEN).then(|| Seckey::from_slice(&bytes))
}

/// Encodes a public key under the network's public-key prefix.
pub fn encode_pubkey(pubkey: &Pubkey, params: &NetworkParams) -> Option<String> {
    encode_program(params.pubkey.prefix, params.pubkey.version, pubkey.as_bytes())
}

pub fn decode_pubkey(text: &str, params: &NetworkParams) -> Option<Pubkey> {
    let bytes = decode_program(params.pubkey.prefix, params.pubkey.version, text)?;
    (bytes.len() == Pubkey::LEN).then(|| Pubkey::from_slice(&bytes))
}
