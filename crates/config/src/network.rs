//! Network registry for balance queries and payment resolution.
//!
//! Provides chain-specific RPC endpoints and USDC deployments for the
//! networks the CLI knows about (Base, Avalanche and their testnets).

use crate::ConfigError;
use alloy_primitives::{address, Address};
use serde::Serialize;

/// CAIP-2 namespace for EVM chains.
pub const EIP155_NAMESPACE: &str = "eip155";

/// A single network entry: where to reach it and which token to query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    /// Registry key (e.g. `base-sepolia`)
    pub name: &'static str,
    /// Human readable name
    pub display_name: &'static str,
    /// EVM chain ID
    pub chain_id: u64,
    /// JSON-RPC endpoint url
    pub rpc_url: String,
    /// Token contract address
    pub token: Address,
    /// Token symbol
    pub symbol: &'static str,
    /// Token decimal precision
    pub decimals: u8,
}

impl NetworkDescriptor {
    /// Base mainnet configuration.
    pub fn base() -> Self {
        Self {
            name: "base",
            display_name: "Base",
            chain_id: 8453,
            rpc_url: "https://mainnet.base.org".to_string(),
            // https://basescan.org/token/0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913
            token: address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
            symbol: "USDC",
            decimals: 6,
        }
    }

    /// Base Sepolia testnet configuration.
    pub fn base_sepolia() -> Self {
        Self {
            name: "base-sepolia",
            display_name: "Base Sepolia",
            chain_id: 84532,
            rpc_url: "https://sepolia.base.org".to_string(),
            token: address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
            symbol: "USDC",
            decimals: 6,
        }
    }

    /// Avalanche C-Chain configuration.
    pub fn avalanche() -> Self {
        Self {
            name: "avalanche",
            display_name: "Avalanche",
            chain_id: 43114,
            rpc_url: "https://api.avax.network/ext/bc/C/rpc".to_string(),
            token: address!("0xB97EF9Ef8734C71904D8002F8b6Bc66Dd9c48a6E"),
            symbol: "USDC",
            decimals: 6,
        }
    }

    /// Avalanche Fuji testnet configuration.
    pub fn avalanche_fuji() -> Self {
        Self {
            name: "avalanche-fuji",
            display_name: "Avalanche Fuji",
            chain_id: 43113,
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
            token: address!("0x5425890298aed601595a70AB815c96711a31Bc65"),
            symbol: "USDC",
            decimals: 6,
        }
    }

    /// CAIP-2 chain identifier, e.g. `eip155:8453`.
    pub fn caip2(&self) -> String {
        format!("{EIP155_NAMESPACE}:{}", self.chain_id)
    }
}

/// Parse a CAIP-2 `eip155:<id>` identifier into a numeric chain ID.
pub fn parse_eip155_chain_id(network: &str) -> Option<u64> {
    let (namespace, reference) = network.split_once(':')?;
    if namespace != EIP155_NAMESPACE {
        return None;
    }
    reference.parse().ok()
}

/// The set of known networks, fixed once built.
///
/// Iteration follows declaration order so that reports are deterministic.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<NetworkDescriptor>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        NetworkRegistryBuilder::builtin().build()
    }
}

impl NetworkRegistry {
    /// Registry with the built-in networks and their public RPC endpoints.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Look up a network by registry name.
    pub fn get(&self, name: &str) -> Option<&NetworkDescriptor> {
        self.networks.iter().find(|n| n.name == name)
    }

    /// Look up a network by numeric chain ID.
    pub fn by_chain_id(&self, chain_id: u64) -> Option<&NetworkDescriptor> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    /// Resolve either a CAIP-2 identifier or a registry name.
    pub fn resolve(&self, network: &str) -> Option<&NetworkDescriptor> {
        parse_eip155_chain_id(network).map_or_else(|| self.get(network), |id| self.by_chain_id(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.networks.iter()
    }

    /// Registry names in declaration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.networks.iter().map(|n| n.name).collect()
    }

    /// Select either every network or the single named one.
    ///
    /// An unknown name is an error listing the available networks.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<&NetworkDescriptor>, ConfigError> {
        match name {
            None => Ok(self.networks.iter().collect()),
            Some(name) => self
                .get(name)
                .map(|n| vec![n])
                .ok_or_else(|| self.unknown_network(name)),
        }
    }

    fn unknown_network(&self, name: &str) -> ConfigError {
        ConfigError::UnknownNetwork {
            name: name.to_string(),
            available: self.names().join(", "),
        }
    }
}

/// Builder for registries with overridden endpoints.
#[derive(Debug, Clone)]
pub struct NetworkRegistryBuilder {
    networks: Vec<NetworkDescriptor>,
}

impl NetworkRegistryBuilder {
    /// Start with the built-in networks.
    pub fn builtin() -> Self {
        Self {
            networks: vec![
                NetworkDescriptor::base(),
                NetworkDescriptor::base_sepolia(),
                NetworkDescriptor::avalanche(),
                NetworkDescriptor::avalanche_fuji(),
            ],
        }
    }

    /// Override the RPC endpoint of a named network.
    pub fn rpc_url(mut self, name: &str, url: impl Into<String>) -> Result<Self, ConfigError> {
        let Some(network) = self.networks.iter_mut().find(|n| n.name == name) else {
            return Err(ConfigError::UnknownNetwork {
                name: name.to_string(),
                available: self.networks.iter().map(|n| n.name).collect::<Vec<_>>().join(", "),
            });
        };
        network.rpc_url = url.into();
        Ok(self)
    }

    /// Build the registry.
    pub fn build(self) -> NetworkRegistry {
        NetworkRegistry {
            networks: self.networks,
        }
    }
}
