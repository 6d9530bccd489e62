//! Value types and the tagged wire stream.
//!
//! - `Uint256`, `Decimal`: numeric values with exact wire forms
//! - `Seckey`, `Pubkey`, `Pubkeyhash`, `Subpubkeyhash`, `Signature`: fixed-length records
//! - `AssetId`: compact asset handles and their numeric ids
//! - `Stream`: tagged value buffer, with `Encode`/`Decode` on top

pub mod address;
pub mod asset;
pub mod convert;
pub mod decimal;
pub mod encoding;
pub mod hash;
pub mod keys;
pub mod stream;
pub mod uint256;
pub mod viewable;
