//! Compact asset identifiers.
//!
//! An asset is named by a handle `CHAIN[:TOKEN[:CHECKSUM]]`. The handle bytes
//! read little-endian form the numeric id used on the wire, so the handle must
//! fit in a 256-bit integer. The checksum ties a token symbol to one contract
//! address so that two tokens sharing a symbol get different ids.

use crate::types::hash::sha1;
use crate::types::uint256::Uint256;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const CHAIN_MAX_LEN: usize = 8;
pub const TOKEN_MAX_LEN: usize = 8;
pub const CHECKSUM_LEN: usize = 8;
/// `CHAIN:TOKEN:CHECKSUM` at full length.
pub const ASSET_ID_MAX_BYTES: usize = CHAIN_MAX_LEN + 1 + TOKEN_MAX_LEN + 1 + CHECKSUM_LEN;

const SEPARATOR: u8 = b':';

/// Numeric view of an asset id: a native integer when it is a safe integer,
/// otherwise compact `0x` hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumericId {
    Safe(u64),
    Hex(String),
}

impl fmt::Display for NumericId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericId::Safe(n) => write!(f, "{n}"),
            NumericId::Hex(h) => f.write_str(h),
        }
    }
}

/// Asset identifier backed by its handle bytes.
#[derive(Clone)]
pub struct AssetId {
    handle: Vec<u8>,
}

/// Checksum of a contract address: the first [`CHECKSUM_LEN`] characters of
/// unpadded base64url(SHA-1(lowercase address)), upper-cased.
pub fn contract_checksum(contract: &str) -> String {
    let digest = sha1(contract.trim().to_lowercase().as_bytes());
    let mut text = URL_SAFE_NO_PAD.encode(digest);
    text.truncate(CHECKSUM_LEN);
    text.to_ascii_uppercase()
}

fn component(text: &str, max: usize) -> String {
    text.chars()
        .filter(|c| c.is_ascii_graphic() && *c != ':')
        .take(max)
        .collect::<String>()
        .to_ascii_uppercase()
}

impl AssetId {
    /// Builds the canonical handle from a chain code, an optional token code
    /// and the token's contract address.
    ///
    /// The contract address only contributes when a token is given. A token
    /// that is empty once filtered counts as absent.
    pub fn from_handle(chain: &str, token: Option<&str>, contract: Option<&str>) -> AssetId {
        let mut handle = component(chain, CHAIN_MAX_LEN);
        let token = token.map(|t| component(t, TOKEN_MAX_LEN)).filter(|t| !t.is_empty());
        if let Some(token) = token {
            handle.push(':');
            handle.push_str(&token);
            if let Some(contract) = contract {
                handle.push(':');
                handle.push_str(&contract_checksum(contract));
            }
        }
        AssetId {
            handle: handle.into_bytes(),
        }
    }

    /// Parses handle text such as `BTC` or `ETH:USDT:FARLDSDZ`.
    ///
    /// Components are upper-cased; `None` if any is empty or too long.
    pub fn parse(text: &str) -> Option<AssetId> {
        let parts: Vec<&str> = text.trim().split(':').collect();
        let limits = [CHAIN_MAX_LEN, TOKEN_MAX_LEN, CHECKSUM_LEN];
        if parts.len() > limits.len() {
            return None;
        }
        for (part, max) in parts.iter().zip(limits) {
            if part.is_empty() || part.len() > max || !part.bytes().all(|b| b.is_ascii_graphic()) {
                return None;
            }
        }
        Some(AssetId {
            handle: parts.join(":").to_ascii_uppercase().into_bytes(),
        })
    }

    /// Wraps raw handle bytes; `None` if empty or longer than [`ASSET_ID_MAX_BYTES`].
    pub fn from_handle_bytes(bytes: &[u8]) -> Option<AssetId> {
        if bytes.is_empty() || bytes.len() > ASSET_ID_MAX_BYTES {
            return None;
        }
        Some(AssetId {
            handle: bytes.to_vec(),
        })
    }

    /// Rebuilds the handle from a numeric id.
    pub fn from_id(id: &Uint256) -> Option<AssetId> {
        let le = id.to_le_bytes();
        Self::from_handle_bytes(&le[..id.byte_count()])
    }

    pub fn handle(&self) -> &[u8] {
        &self.handle
    }

    fn parts(&self) -> impl Iterator<Item = &[u8]> {
        self.handle.split(|&b| b == SEPARATOR)
    }

    fn part(&self, index: usize) -> Option<String> {
        self.parts()
            .nth(index)
            .map(|p| String::from_utf8_lossy(p).into_owned())
    }

    pub fn chain(&self) -> String {
        self.part(0).unwrap_or_default()
    }

    pub fn token(&self) -> Option<String> {
        self.part(1)
    }

    pub fn checksum(&self) -> Option<String> {
        self.part(2)
    }

    /// True when no component is empty and token and checksum are either
    /// both present or both absent.
    pub fn is_valid(&self) -> bool {
        self.handle.len() <= ASSET_ID_MAX_BYTES
            && self.parts().count() <= 3
            && self.parts().all(|p| !p.is_empty())
            && self.token().is_some() == self.checksum().is_some()
    }

    /// Handle bytes read little-endian.
    pub fn to_uint256(&self) -> Uint256 {
        // Handles are capped below 32 bytes at construction.
        Uint256::from_le_slice(&self.handle).unwrap_or_default()
    }

    /// Canonical 64-digit hex of [`AssetId::to_uint256`].
    pub fn to_hex(&self) -> String {
        self.to_uint256().to_hex()
    }

    pub fn id(&self) -> NumericId {
        let value = self.to_uint256();
        match value.to_safe_integer() {
            Some(n) => NumericId::Safe(n),
            None => NumericId::Hex(value.to_compact_hex()),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.handle))
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({self}, id={})", self.id())
    }
}

impl PartialEq for AssetId {
    fn eq(&self, other: &Self) -> bool {
        self.id().to_string() == other.id().to_string()
    }
}

impl Eq for AssetId {}

impl Hash for AssetId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_uint256().hash(state);
    }
}

impl PartialOrd for AssetId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssetId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_uint256().cmp(&other.to_uint256())
    }
}
