//! Network selection.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConsensusError;

/// The chain a node runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    #[default]
    Main,
    /// Public test network with relaxed minimum difficulty.
    Test,
    /// Local regression testing, no retargeting.
    Regtest,
}

impl Network {
    /// All networks, in selector order.
    pub const ALL: [Network; 3] = [Network::Main, Network::Test, Network::Regtest];

    /// Selector string for this network.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Test => "test",
            Network::Regtest => "regtest",
        }
    }

    /// Get display name for UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::Main => "Mainnet",
            Network::Test => "Testnet",
            Network::Regtest => "Regtest",
        }
    }
}

impl FromStr for Network {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            "regtest" => Ok(Network::Regtest),
            _ => Err(ConsensusError::UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_str() {
        assert_eq!("main".parse::<Network>(), Ok(Network::Main));
        assert_eq!("MAINNET".parse::<Network>(), Ok(Network::Main));
        assert_eq!("test".parse::<Network>(), Ok(Network::Test));
        assert_eq!("regtest".parse::<Network>(), Ok(Network::Regtest));
        assert_eq!(
            "signet".parse::<Network>(),
            Err(ConsensusError::UnknownNetwork("signet".to_string()))
        );
    }

    #[test]
    fn test_name_roundtrip() {
        for network in Network::ALL {
            assert_eq!(network.name().parse::<Network>(), Ok(network));
            assert_eq!(network.to_string(), network.name());
        }
    }
}
