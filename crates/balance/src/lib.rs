//! Balance monitoring for wallet token holdings.
//!
//! This crate provides high-level interfaces for querying USDC balances
//! across the configured networks with raw `eth_call` requests, and for
//! rendering atomic amounts in human units.

pub mod amount;
pub mod call;
pub mod monitor;

use alloy_primitives::{Address, U256};
use client::ClientError;
use config::{ConfigError, NetworkDescriptor};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BalanceError {
    #[error(transparent)]
    Rpc(#[from] ClientError),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Represents a token balance at the latest block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// The address holding the balance
    pub holder: Address,
    /// The token contract address
    pub asset: Address,
    /// The balance amount in atomic units
    pub amount: U256,
}

/// One reported line of a wallet query.
///
/// A failed query keeps its network identity and carries the error text in
/// place of a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub network: String,
    pub chain_id: String,
    pub asset: String,
    pub balance: String,
    pub decimals: u8,
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BalanceEntry {
    /// Marker placed in `balance` when the query failed.
    pub const ERROR: &'static str = "error";

    pub fn from_balance(network: &NetworkDescriptor, balance: &Balance) -> Self {
        Self {
            network: network.name.to_string(),
            chain_id: network.caip2(),
            asset: network.symbol.to_string(),
            balance: amount::to_human(balance.amount, network.decimals),
            decimals: network.decimals,
            raw: balance.amount.to_string(),
            error: None,
        }
    }

    pub fn failed(network: &NetworkDescriptor, error: &BalanceError) -> Self {
        Self {
            network: network.name.to_string(),
            chain_id: network.caip2(),
            asset: network.symbol.to_string(),
            balance: Self::ERROR.to_string(),
            decimals: network.decimals,
            raw: String::new(),
            error: Some(error.to_string()),
        }
    }

    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Trait for monitoring token balances on a network.
pub trait Monitor: Send + Sync {
    /// Query the token balance of `holder` on a single network.
    fn query_balance(
        &self,
        network: &NetworkDescriptor,
        holder: Address,
    ) -> impl Future<Output = Result<Balance, BalanceError>> + Send;
}
