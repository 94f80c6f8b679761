//! Configuration types for the x402 CLI.
//!
//! This crate provides:
//! - The network registry (RPC endpoints, USDC deployments)
//! - Optional TOML settings that override registry endpoints

pub mod network;

pub use network::{
    parse_eip155_chain_id, NetworkDescriptor, NetworkRegistry, NetworkRegistryBuilder,
};

use serde::Deserialize;
use std::{collections::BTreeMap, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Named network is not in the registry
    #[error("unknown network: {name} (available: {available})")]
    UnknownNetwork { name: String, available: String },

    /// Settings file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for [`Settings`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// User settings loaded from a TOML file.
///
/// ```toml
/// [networks.base-sepolia]
/// rpc_url = "http://localhost:8545"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Per-network overrides keyed by registry name
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkOverride {
    /// Replacement JSON-RPC endpoint
    pub rpc_url: Option<String>,
}

impl Settings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Build the network registry with these overrides applied.
    pub fn registry(&self) -> Result<NetworkRegistry, ConfigError> {
        let mut builder = NetworkRegistryBuilder::builtin();
        for (name, network) in &self.networks {
            if let Some(url) = &network.rpc_url {
                builder = builder.rpc_url(name, url.clone())?;
            }
        }

        Ok(builder.build())
    }
}
