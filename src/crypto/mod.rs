//! Keys, signatures, addresses and sealed messages.

pub mod key_pair;
pub mod network;
pub mod sealed_box;
pub mod subaddress;
