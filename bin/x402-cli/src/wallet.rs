//! `wallet` command: signer address and USDC balances per network.

use crate::{
    output::{Console, ExitStatus},
    RunError,
};
use balance::{monitor::BalanceMonitor, BalanceEntry};
use client::RpcTransport;
use config::NetworkRegistry;
use payment::PaymentBackend;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// Structured output of the wallet command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalletReport {
    pub address: String,
    pub balances: Vec<BalanceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn wallet<B, T, W, E>(
    backend: &B,
    monitor: &BalanceMonitor<T>,
    registry: &NetworkRegistry,
    credential: Option<&str>,
    network: Option<&str>,
    console: &mut Console<W, E>,
) -> ExitStatus
where
    B: PaymentBackend,
    T: RpcTransport,
    W: Write,
    E: Write,
{
    let mut report = WalletReport::default();

    let outcome = query(backend, monitor, registry, credential, network, &mut report).await;
    if let Err(e) = &outcome {
        debug!(error = %e, "Wallet query failed");
        report.error = Some(e.to_string());
    }

    if console.is_json() {
        console.json(&report);
    } else if let Err(e) = &outcome {
        console.error(e);
        if let Some(hint) = e.hint() {
            console.note(hint);
        }
    } else {
        console.line(format_args!("Wallet:  {}\n", report.address));
        for entry in &report.balances {
            let name = registry
                .get(&entry.network)
                .map_or(entry.network.as_str(), |n| n.display_name);
            match &entry.error {
                None => console.line(format_args!(
                    "  {:<18}  {} {}",
                    format!("{name}:"),
                    entry.balance,
                    entry.asset
                )),
                Some(error) => console.line(format_args!(
                    "  {:<18}  error: {error}",
                    format!("{name} ({}):", entry.asset)
                )),
            }
        }
    }

    match outcome {
        Ok(()) => ExitStatus::Success,
        Err(_) => ExitStatus::Error,
    }
}

async fn query<B, T>(
    backend: &B,
    monitor: &BalanceMonitor<T>,
    registry: &NetworkRegistry,
    credential: Option<&str>,
    network: Option<&str>,
    report: &mut WalletReport,
) -> Result<(), RunError>
where
    B: PaymentBackend,
    T: RpcTransport,
{
    let credential = credential
        .filter(|c| !c.trim().is_empty())
        .ok_or(RunError::MissingCredential)?;

    let address = backend.signer_address(credential)?;
    report.address = address.to_string();

    report.balances = monitor.query_wallet(registry, network, address).await?;
    Ok(())
}
