use crate::{call, Balance, BalanceEntry, BalanceError, Monitor};
use alloy_primitives::Address;
use client::RpcTransport;
use config::{NetworkDescriptor, NetworkRegistry};
use futures::future::join_all;
use tracing::{debug, warn};

// Balance monitor implementation.
pub struct BalanceMonitor<T> {
    transport: T,
}

impl<T> BalanceMonitor<T>
where
    T: RpcTransport,
{
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn query_erc20(&self, network: &NetworkDescriptor, holder: Address) -> Result<Balance, BalanceError> {
        debug!(
            "Querying {} {} balance: address={}",
            network.name, network.symbol, holder
        );

        let data = call::balance_of_calldata(holder);
        let result = self
            .transport
            .eth_call(&network.rpc_url, network.token, data)
            .await?;
        let amount = call::decode_uint256(&result)?;

        Ok(Balance {
            holder,
            asset: network.token,
            amount,
        })
    }

    /// Query every network concurrently, one entry per network.
    ///
    /// Entries come back in the order of `networks`; a failure on one network
    /// is recorded in its entry and never affects the others.
    pub async fn query_networks(
        &self,
        networks: &[&NetworkDescriptor],
        holder: Address,
    ) -> Vec<BalanceEntry> {
        join_all(networks.iter().map(|network| self.entry(network, holder))).await
    }

    /// Query a wallet on all networks, or only on `network` when given.
    ///
    /// An unknown network name fails before any RPC call is made.
    pub async fn query_wallet(
        &self,
        registry: &NetworkRegistry,
        network: Option<&str>,
        holder: Address,
    ) -> Result<Vec<BalanceEntry>, BalanceError> {
        let networks = registry.select(network)?;
        Ok(self.query_networks(&networks, holder).await)
    }

    async fn entry(&self, network: &NetworkDescriptor, holder: Address) -> BalanceEntry {
        match self.query_balance(network, holder).await {
            Ok(balance) => BalanceEntry::from_balance(network, &balance),
            Err(e) => {
                warn!(network = network.name, error = %e, "Balance query failed");
                BalanceEntry::failed(network, &e)
            }
        }
    }
}

impl<T> Monitor for BalanceMonitor<T>
where
    T: RpcTransport,
{
    async fn query_balance(&self, network: &NetworkDescriptor, holder: Address) -> Result<Balance, BalanceError> {
        self.query_erc20(network, holder).await
    }
}
