//! chain configuration and endpoints

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ClientError, Result};

/// an evm chain reachable over json-rpc
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// eip-155 chain id
    pub chain_id: u64,
    /// chain name
    pub name: String,
    /// http json-rpc endpoint
    pub rpc_url: String,
    /// native currency symbol
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

fn default_symbol() -> String {
    "ETH".into()
}

impl ChainConfig {
    /// ethereum sepolia testnet
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11_155_111,
            name: "sepolia".into(),
            rpc_url: "https://rpc.sepolia.org".into(),
            symbol: "ETH".into(),
        }
    }

    /// reactive network testnet
    pub fn reactive_lasna() -> Self {
        Self {
            chain_id: 5_318_007,
            name: "reactive-lasna".into(),
            rpc_url: "https://lasna-rpc.rnk.dev".into(),
            symbol: "REACT".into(),
        }
    }

    /// local dev node (anvil / hardhat)
    pub fn local() -> Self {
        Self {
            chain_id: 31_337,
            name: "local".into(),
            rpc_url: "http://127.0.0.1:8545".into(),
            symbol: "ETH".into(),
        }
    }
}

/// client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// account the provider signs for
    pub sender: Address,
    /// pool contract on the home chain
    pub pool: Address,
    /// chain the pool lives on
    pub home_chain: u64,
    /// known chains
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    /// receipt polling interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// http request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    2_000
}

fn default_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sender: Address::ZERO,
            pool: Address::ZERO,
            home_chain: ChainConfig::local().chain_id,
            chains: vec![ChainConfig::local()],
            poll_interval_ms: default_poll_interval(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml(&s)
    }

    /// look up a configured chain
    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    pub fn home(&self) -> Result<&ChainConfig> {
        self.chain(self.home_chain)
            .ok_or(ClientError::UnknownChain(self.home_chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = ClientConfig::from_toml(
            r#"
            sender = "0x00000000000000000000000000000000000000aa"
            pool = "0x00000000000000000000000000000000000000bb"
            home_chain = 11155111

            [[chains]]
            chain_id = 11155111
            name = "sepolia"
            rpc_url = "http://localhost:8545"

            [[chains]]
            chain_id = 5318007
            name = "lasna"
            rpc_url = "http://localhost:8546"
            symbol = "REACT"
            "#,
        )
        .unwrap();

        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.home().unwrap().name, "sepolia");
        assert_eq!(config.chain(11_155_111).unwrap().symbol, "ETH");
        assert_eq!(config.chain(5_318_007).unwrap().symbol, "REACT");
    }

    #[test]
    fn test_missing_home_chain() {
        let config = ClientConfig {
            home_chain: 1,
            ..Default::default()
        };
        assert!(matches!(config.home(), Err(ClientError::UnknownChain(1))));
    }
}
