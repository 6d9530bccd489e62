//! Network parameter sets.

use std::fmt;
use std::str::FromStr;

/// Domain separator prepended to signed messages.
pub const MESSAGE_DOMAIN: &str = "\x19Chainwire Signed Message:\n";

/// Largest message accepted by message signing.
pub const MESSAGE_MAX_BYTES: usize = 4096;

/// Prefix and version of one kind of encoded key material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoding {
    pub prefix: &'static str,
    pub version: u8,
}

/// Encoding parameters of a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkParams {
    pub name: &'static str,
    pub address: Encoding,
    pub seckey: Encoding,
    pub pubkey: Encoding,
}

pub const MAINNET: NetworkParams = NetworkParams {
    name: "mainnet",
    address: Encoding { prefix: "cw", version: 1 },
    seckey: Encoding { prefix: "cwsk", version: 2 },
    pubkey: Encoding { prefix: "cwpk", version: 3 },
};

pub const TESTNET: NetworkParams = NetworkParams {
    name: "testnet",
    address: Encoding { prefix: "tcw", version: 5 },
    seckey: Encoding { prefix: "tcwsk", version: 6 },
    pubkey: Encoding { prefix: "tcwpk", version: 7 },
};

pub const REGTEST: NetworkParams = NetworkParams {
    name: "regtest",
    address: Encoding { prefix: "rcw", version: 9 },
    seckey: Encoding { prefix: "rcwsk", version: 10 },
    pubkey: Encoding { prefix: "rcwpk", version: 11 },
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet, Network::Regtest];

    pub fn params(self) -> &'static NetworkParams {
        match self {
            Network::Mainnet => &MAINNET,
            Network::Testnet => &TESTNET,
            Network::Regtest => &REGTEST,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.params().name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" | "reg" => Ok(Network::Regtest),
            other => Err(format!("unknown network `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_and_versions_are_distinct() {
        let mut prefixes = Vec::new();
        let mut versions = Vec::new();
        for network in Network::ALL {
            let p = network.params();
            for enc in [p.address, p.seckey, p.pubkey] {
                prefixes.push(enc.prefix);
                versions.push(enc.version);
                assert!(enc.version < 32);
            }
        }
        prefixes.sort();
        prefixes.dedup();
        versions.sort();
        versions.dedup();
        assert_eq!(prefixes.len(), 9);
        assert_eq!(versions.len(), 9);
    }

    #[test]
    fn parse_and_display() {
        for network in Network::ALL {
            assert_eq!(network.to_string().parse::<Network>(), Ok(network));
        }
        assert_eq!(" TESTNET ".parse::<Network>(), Ok(Network::Testnet));
        assert!("devnet".parse::<Network>().is_err());
    }
}
