//! Wire format and address encoding for a blockchain client SDK.
//!
//! Provides 256-bit integers, fixed-length key records, asset identifiers,
//! the tagged value stream, schema-driven transaction encoding, and
//! checksummed address and subaddress codecs.

pub mod core;
pub mod crypto;
pub mod types;
pub mod utils;
