//! Network parameters for fixture chains

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The network a key, address or chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
    UnitTest,
}

impl Network {
    /// One-byte prefix mixed into address derivation so the same key yields
    /// a different address on every network.
    pub fn address_prefix(self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6f,
            Network::Regtest => 0x7a,
            Network::UnitTest => 0x7b,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
            Network::UnitTest => "unittest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            "unittest" => Ok(Network::UnitTest),
            other => Err(ChainError::ConfigError(format!("Unknown network: {}", other))),
        }
    }
}

/// Parameters shared by every block of a chain.
///
/// `genesis_difficulty` is the number of leading zero bits a header hash
/// needs; fixture chains keep it low so solving stays cheap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkParams {
    pub network: Network,
    #[serde(default = "default_difficulty")]
    pub genesis_difficulty: u32,
    #[serde(default = "default_genesis_timestamp")]
    pub genesis_timestamp: u64,
}

impl NetworkParams {
    /// Highest difficulty a header may carry; a 256-bit target cannot have more leading zeros.
    pub const MAX_DIFFICULTY: u32 = 255;

    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            genesis_difficulty: 20,
            genesis_timestamp: default_genesis_timestamp(),
        }
    }

    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            genesis_difficulty: 16,
            genesis_timestamp: default_genesis_timestamp(),
        }
    }

    pub fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            genesis_difficulty: default_difficulty(),
            genesis_timestamp: default_genesis_timestamp(),
        }
    }

    pub fn unit_tests() -> Self {
        Self {
            network: Network::UnitTest,
            genesis_difficulty: 4,
            genesis_timestamp: default_genesis_timestamp(),
        }
    }

    /// Parses parameters from TOML, e.g. `network = "regtest"`.
    pub fn from_toml_str(config_str: &str) -> Result<Self, ChainError> {
        let params: NetworkParams = toml::from_str(config_str)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        if self.genesis_difficulty > Self::MAX_DIFFICULTY {
            return Err(ChainError::ConfigError(format!(
                "genesis_difficulty {} exceeds maximum {}",
                self.genesis_difficulty,
                Self::MAX_DIFFICULTY
            )));
        }
        Ok(())
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::unit_tests()
    }
}

fn default_difficulty() -> u32 {
    8
}

fn default_genesis_timestamp() -> u64 {
    // 2023-01-01T00:00:00Z
    1_672_531_200
}
